use super::handlers::{
    cancel_payment, fetch_payment, initiate_payment, payment_webhook, verify_payment,
};
use crate::middleware::HeaderValidation;
use actix_web::web;

pub fn payment_route(cfg: &mut web::ServiceConfig) {
    // Gateways authenticate through the adapter's signature check, not headers.
    cfg.service(web::resource("/webhook/{provider}").route(web::post().to(payment_webhook)));
    cfg.service(
        web::resource("/initiate").route(web::post().to(initiate_payment).wrap(HeaderValidation)),
    );
    cfg.service(
        web::resource("/{id}/verify").route(web::post().to(verify_payment).wrap(HeaderValidation)),
    );
    cfg.service(
        web::resource("/{id}/cancel").route(web::post().to(cancel_payment).wrap(HeaderValidation)),
    );
    cfg.service(web::resource("/{id}").route(web::get().to(fetch_payment).wrap(HeaderValidation)));
}
