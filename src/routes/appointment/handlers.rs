use super::schemas::{
    AppointmentCancelRequest, AppointmentData, AppointmentListFilter, AppointmentQuoteData,
    AppointmentStatusUpdateRequest, CreateAppointmentRequest, NewAppointment,
};
use super::utils::BookingManager;
use crate::errors::GenericError;
use crate::schemas::{GenericResponse, RequestMetaData};

use actix_web::web;
use utoipa::TupleUnit;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/appointment/create",
    tag = "Appointment",
    description = "Reserves a provider's time slot. Only one pending or confirmed appointment may hold a slot.",
    summary = "Appointment Creation Request",
    request_body(content = CreateAppointmentRequest, description = "Request Body"),
    responses(
        (status=200, description= "Appointment created", body= GenericResponse<AppointmentData>),
        (status=400, description= "Invalid Request body", body= GenericResponse<TupleUnit>),
        (status=404, description= "Service not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Slot already booked", body= GenericResponse<TupleUnit>),
        (status=500, description= "Internal Server Error", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("x-user-id" = String, Header, description = "Acting user id"),
        ("x-request-id" = String, Header, description = "Request id"),
        ("x-device-id" = String, Header, description = "Device id"),
    )
)]
#[tracing::instrument(name = "appointment creation", skip(manager, body), fields(request_id = %meta_data.request_id))]
pub async fn create_appointment(
    body: CreateAppointmentRequest,
    manager: web::Data<BookingManager>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<AppointmentData>>, GenericError> {
    let data = manager
        .create_appointment(NewAppointment::from_request(meta_data.user_id, body))
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully created appointment",
        Some(data),
    )))
}

#[utoipa::path(
    get,
    path = "/appointment/list",
    tag = "Appointment",
    description = "Lists the caller's appointments, optionally narrowed by the caller's role and by status.",
    summary = "Appointment List Request",
    responses(
        (status=200, description= "Appointments", body= GenericResponse<Vec<AppointmentData>>),
        (status=400, description= "Invalid filter", body= GenericResponse<TupleUnit>),
        (status=500, description= "Internal Server Error", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("role" = Option<String>, Query, description = "REQUESTER or PROVIDER"),
        ("status" = Option<String>, Query, description = "Appointment status"),
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "appointment list", skip(manager))]
pub async fn list_appointments(
    filter: web::Query<AppointmentListFilter>,
    manager: web::Data<BookingManager>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<Vec<AppointmentData>>>, GenericError> {
    let data = manager
        .list_appointments(meta_data.user_id, filter.into_inner())
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched appointments",
        Some(data),
    )))
}

#[utoipa::path(
    get,
    path = "/appointment/{id}",
    tag = "Appointment",
    description = "Returns an appointment to one of its participants.",
    summary = "Appointment Fetch Request",
    responses(
        (status=200, description= "Appointment", body= GenericResponse<AppointmentData>),
        (status=403, description= "Not a participant", body= GenericResponse<TupleUnit>),
        (status=404, description= "Appointment not found", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("id" = String, Path, description = "Appointment id"),
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "appointment fetch", skip(manager))]
pub async fn fetch_appointment(
    path: web::Path<Uuid>,
    manager: web::Data<BookingManager>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<AppointmentData>>, GenericError> {
    let data = manager
        .get_appointment(meta_data.user_id, path.into_inner())
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched appointment",
        Some(data),
    )))
}

#[utoipa::path(
    post,
    path = "/appointment/{id}/status",
    tag = "Appointment",
    description = "Moves an appointment through its lifecycle. Requesters may only cancel; providers confirm, complete, cancel or mark no-shows.",
    summary = "Appointment Status Update Request",
    request_body(content = AppointmentStatusUpdateRequest, description = "Request Body"),
    responses(
        (status=200, description= "Updated appointment", body= GenericResponse<AppointmentData>),
        (status=403, description= "Caller does not hold the claimed role", body= GenericResponse<TupleUnit>),
        (status=404, description= "Appointment not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Transition not allowed", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("id" = String, Path, description = "Appointment id"),
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "appointment status update", skip(manager))]
pub async fn update_appointment_status(
    path: web::Path<Uuid>,
    body: AppointmentStatusUpdateRequest,
    manager: web::Data<BookingManager>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<AppointmentData>>, GenericError> {
    let data = manager
        .update_status(
            meta_data.user_id,
            path.into_inner(),
            body.status,
            body.actor_role,
        )
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully updated appointment",
        Some(data),
    )))
}

#[utoipa::path(
    post,
    path = "/appointment/{id}/cancel",
    tag = "Appointment",
    description = "Cancels a pending or confirmed appointment and frees its slot.",
    summary = "Appointment Cancellation Request",
    request_body(content = AppointmentCancelRequest, description = "Request Body"),
    responses(
        (status=200, description= "Cancelled appointment", body= GenericResponse<AppointmentData>),
        (status=403, description= "Caller does not hold the claimed role", body= GenericResponse<TupleUnit>),
        (status=404, description= "Appointment not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Appointment can no longer be cancelled", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("id" = String, Path, description = "Appointment id"),
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "appointment cancellation", skip(manager))]
pub async fn cancel_appointment(
    path: web::Path<Uuid>,
    body: AppointmentCancelRequest,
    manager: web::Data<BookingManager>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<AppointmentData>>, GenericError> {
    let data = manager
        .cancel_appointment(meta_data.user_id, path.into_inner(), body.actor_role)
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully cancelled appointment",
        Some(data),
    )))
}

#[utoipa::path(
    get,
    path = "/appointment/{id}/quote",
    tag = "Appointment",
    description = "Commission and tax breakdown for the appointment's service.",
    summary = "Appointment Quote Request",
    responses(
        (status=200, description= "Price breakdown", body= GenericResponse<AppointmentQuoteData>),
        (status=400, description= "Appointment has no service", body= GenericResponse<TupleUnit>),
        (status=403, description= "Not a participant", body= GenericResponse<TupleUnit>),
        (status=404, description= "Appointment not found", body= GenericResponse<TupleUnit>),
    ),
    params(
        ("id" = String, Path, description = "Appointment id"),
        ("x-user-id" = String, Header, description = "Acting user id"),
    )
)]
#[tracing::instrument(name = "appointment quote", skip(manager))]
pub async fn quote_appointment(
    path: web::Path<Uuid>,
    manager: web::Data<BookingManager>,
    meta_data: RequestMetaData,
) -> Result<web::Json<GenericResponse<AppointmentQuoteData>>, GenericError> {
    let data = manager
        .quote_appointment(meta_data.user_id, path.into_inner())
        .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully calculated quote",
        Some(data),
    )))
}
