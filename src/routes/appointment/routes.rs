use super::handlers::{
    cancel_appointment, create_appointment, fetch_appointment, list_appointments,
    quote_appointment, update_appointment_status,
};
use actix_web::web;

pub fn appointment_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/create").route(web::post().to(create_appointment)));
    cfg.service(web::resource("/list").route(web::get().to(list_appointments)));
    cfg.service(web::resource("/{id}/status").route(web::post().to(update_appointment_status)));
    cfg.service(web::resource("/{id}/cancel").route(web::post().to(cancel_appointment)));
    cfg.service(web::resource("/{id}/quote").route(web::get().to(quote_appointment)));
    cfg.service(web::resource("/{id}").route(web::get().to(fetch_appointment)));
}
