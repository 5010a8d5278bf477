use crate::routes::{appointment, payment, util, wallet};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        appointment::handlers::create_appointment,
        appointment::handlers::list_appointments,
        appointment::handlers::fetch_appointment,
        appointment::handlers::update_appointment_status,
        appointment::handlers::cancel_appointment,
        appointment::handlers::quote_appointment,
        payment::handlers::initiate_payment,
        payment::handlers::fetch_payment,
        payment::handlers::verify_payment,
        payment::handlers::cancel_payment,
        payment::handlers::payment_webhook,
        wallet::handlers::fetch_wallet,
        wallet::handlers::list_wallet_transactions,
        wallet::handlers::withdraw_from_wallet,
        util::handlers::health_check,
    ),
    tags(
        (name = "Marketplace Booking REST API", description = "Booking, payment and wallet endpoints")
    ),
)]
pub struct ApiDoc {}
