pub(crate) mod errors;
pub mod handlers;
pub(crate) mod models;
mod routes;
pub mod schemas;
#[cfg(test)]
mod tests;
pub mod utils;
pub use routes::wallet_route;
