use super::schemas::{
    PaymentData, PaymentInitiation, PaymentInitiationData, PaymentInitiationRequest,
    ReconciliationData,
};
use super::utils::PaymentOrchestrator;
use crate::errors::GenericError;
use crate::schemas::{GenericResponse, RequestMetaData};

use actix_web::{web, HttpRequest};
use utoipa::TupleUnit;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/payment/initiate",
    tag = "Payment",
    description = "Starts a payment through the wallet or one of the configured gateways. Wallet payments settle immediately; gateway payments return a redirect URL and settle on callback.",
    summary = "Payment Initiation Request",
    request_body(content = PaymentInitiationRequest, description = "Request Body"),
    responses(
        (status=200, description= "Payment initiated", body= GenericResponse<PaymentInitiationData>),
        (status=400, description= "Invalid Request body", body= GenericResponse<TupleUnit>),
        (status=402, description= "Insufficient wallet balance", body= GenericResponse<TupleUnit>),
        (status=403, description= "Appointment belongs to another user", body= GenericResponse<TupleUnit>),
        (status=404, description= "Appointment not found", body= GenericResponse<TupleUnit>),
        (status=500, description= "Internal Server Error", body= GenericResponse<TupleUnit>),
        (status=502, description= "Payment provider rejected the request", body= GenericResponse<TupleUnit>),
        (status=503, description= "Payment provider not available", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("x-user-id" = String, Header, description = "Acting user id"),
        ("x-request-id" = String, Header, description = "Request id"),
        ("x-device-id" = String, Header, description = "Device id"),
    )
)]
#[tracing::instrument(name = "payment initiation", skip(orchestrator, body), fields(request_id = %meta_data.request_id))]
pub async fn initiate_payment(
    body: PaymentInitiationRequest,
    orchestrator: web::Data<PaymentOrchestrator>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<PaymentInitiationData>>, GenericError> {
    let request = PaymentInitiation::from_request(meta_data.user_id, body);
    let data = orchestrator.initiate(request).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully initiated payment",
        Some(data),
    )))
}

#[utoipa::path(
    get,
    path = "/payment/{id}",
    tag = "Payment",
    description = "Returns a payment to its payer.",
    summary = "Payment Fetch Request",
    responses(
        (status=200, description= "Payment", body= GenericResponse<PaymentData>),
        (status=403, description= "Not the payer", body= GenericResponse<TupleUnit>),
        (status=404, description= "Payment not found", body= GenericResponse<TupleUnit>),
        (status=500, description= "Internal Server Error", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("id" = String, Path, description = "Payment id"),
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "payment fetch", skip(orchestrator))]
pub async fn fetch_payment(
    path: web::Path<Uuid>,
    orchestrator: web::Data<PaymentOrchestrator>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<PaymentData>>, GenericError> {
    let data = orchestrator
        .get_payment(meta_data.user_id, path.into_inner())
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched payment",
        Some(data),
    )))
}

#[utoipa::path(
    post,
    path = "/payment/{id}/verify",
    tag = "Payment",
    description = "Asks the gateway for the current state of a processing payment and reconciles it when the gateway has an outcome.",
    summary = "Payment Verification Request",
    responses(
        (status=200, description= "Payment after verification", body= GenericResponse<PaymentData>),
        (status=403, description= "Not the payer", body= GenericResponse<TupleUnit>),
        (status=404, description= "Payment not found", body= GenericResponse<TupleUnit>),
        (status=502, description= "Gateway unreachable", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("id" = String, Path, description = "Payment id"),
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "payment verification", skip(orchestrator))]
pub async fn verify_payment(
    path: web::Path<Uuid>,
    orchestrator: web::Data<PaymentOrchestrator>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<PaymentData>>, GenericError> {
    let data = orchestrator
        .verify_payment(meta_data.user_id, path.into_inner())
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully verified payment",
        Some(data),
    )))
}

#[utoipa::path(
    post,
    path = "/payment/{id}/cancel",
    tag = "Payment",
    description = "Abandons a payment that has not been handed to a provider yet.",
    summary = "Payment Cancellation Request",
    responses(
        (status=200, description= "Cancelled payment", body= GenericResponse<PaymentData>),
        (status=400, description= "Payment is no longer pending", body= GenericResponse<TupleUnit>),
        (status=403, description= "Not the payer", body= GenericResponse<TupleUnit>),
        (status=404, description= "Payment not found", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("id" = String, Path, description = "Payment id"),
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "payment cancellation", skip(orchestrator))]
pub async fn cancel_payment(
    path: web::Path<Uuid>,
    orchestrator: web::Data<PaymentOrchestrator>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<PaymentData>>, GenericError> {
    let data = orchestrator
        .cancel_payment(meta_data.user_id, path.into_inner())
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully cancelled payment",
        Some(data),
    )))
}

#[utoipa::path(
    post,
    path = "/payment/webhook/{provider}",
    tag = "Payment",
    description = "Gateway callback. The body is authenticated by the gateway adapter before reconciliation; replays of settled payments succeed without side effects.",
    summary = "Payment Webhook",
    request_body(content = String, description = "Raw gateway payload"),
    responses(
        (status=200, description= "Callback reconciled", body= GenericResponse<ReconciliationData>),
        (status=400, description= "Malformed payload", body= GenericResponse<TupleUnit>),
        (status=401, description= "Invalid signature", body= GenericResponse<TupleUnit>),
        (status=404, description= "Unknown provider or payment", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("provider" = String, Path, description = "gateway_a or gateway_b"),
    )
)]
#[tracing::instrument(name = "payment webhook", skip(orchestrator, req, body))]
pub async fn payment_webhook(
    path: web::Path<String>,
    req: HttpRequest,
    body: web::Bytes,
    orchestrator: web::Data<PaymentOrchestrator>,
) -> Result<web::Json<GenericResponse<ReconciliationData>>, GenericError> {
    let data = orchestrator
        .handle_webhook(&path.into_inner(), req.headers(), &body)
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully processed payment notification",
        Some(data),
    )))
}
