use crate::middleware::HeaderValidation;
use crate::openapi::ApiDoc;
use crate::routes::{appointment_route, payment_route, util_route, wallet_route};
use actix_web::{web, HttpResponse};
use utoipa::OpenApi;

async fn openapi_document() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

pub fn main_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/util").configure(util_route))
        .service(
            web::scope("/appointment")
                .configure(appointment_route)
                .wrap(HeaderValidation),
        )
        .service(web::scope("/payment").configure(payment_route))
        .service(
            web::scope("/wallet")
                .configure(wallet_route)
                .wrap(HeaderValidation),
        )
        .route("/api-docs/openapi.json", web::get().to(openapi_document));
}
