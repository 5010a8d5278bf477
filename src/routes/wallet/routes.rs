use super::handlers::{fetch_wallet, list_wallet_transactions, withdraw_from_wallet};
use actix_web::web;

pub fn wallet_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::get().to(fetch_wallet)));
    cfg.service(web::resource("/transactions").route(web::get().to(list_wallet_transactions)));
    cfg.service(web::resource("/withdraw").route(web::post().to(withdraw_from_wallet)));
}
