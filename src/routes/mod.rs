pub mod appointment;
pub mod payment;
mod route;
pub mod util;
pub mod wallet;
pub use appointment::appointment_route;
pub use payment::payment_route;
pub use route::main_route;
pub use util::util_route;
pub use wallet::wallet_route;
