use crate::schemas::GenericResponse;
use actix_web::web;
use utoipa::TupleUnit;

#[utoipa::path(
    get,
    path = "/util/health_check",
    tag = "Util",
    description = "Liveness probe.",
    summary = "Health Check",
    responses(
        (status=200, description= "Server is running", body= GenericResponse<TupleUnit>),
    )
)]
pub async fn health_check() -> web::Json<GenericResponse<()>> {
    web::Json(GenericResponse::success("Running Server", Some(())))
}
