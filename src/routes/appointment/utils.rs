use super::errors::BookingError;
use super::schemas::{
    ActorRole, Appointment, AppointmentData, AppointmentListFilter, AppointmentQuoteData,
    AppointmentStatus, NewAppointment, ServiceSummary,
};
use crate::notification_client::{notify, NotificationDispatcher, NotificationEvent};
use crate::pricing::breakdown;
use crate::store::{Repository, UnitOfWork};
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Actor-gated appointment state machine. Same-status requests are handled
/// by the caller.
pub fn is_allowed_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
    role: ActorRole,
) -> bool {
    use AppointmentStatus::*;
    match role {
        ActorRole::Requester => matches!((from, to), (Pending, Cancelled) | (Confirmed, Cancelled)),
        ActorRole::Provider => matches!(
            (from, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
        ),
    }
}

/// Whether `role` is ever allowed to move an appointment into `status`.
fn can_target(status: AppointmentStatus, role: ActorRole) -> bool {
    match role {
        ActorRole::Requester => status == AppointmentStatus::Cancelled,
        ActorRole::Provider => status != AppointmentStatus::Pending,
    }
}

pub fn validate_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
    role: ActorRole,
) -> Result<(), BookingError> {
    if is_allowed_transition(from, to, role) {
        Ok(())
    } else {
        Err(BookingError::InvalidTransition { from, to })
    }
}

fn authorize(actor_id: Uuid, role: ActorRole, appointment: &Appointment) -> Result<(), BookingError> {
    let allowed = match role {
        ActorRole::Requester => appointment.requester_id == actor_id,
        ActorRole::Provider => appointment.provider_id == actor_id,
    };
    if allowed {
        Ok(())
    } else {
        Err(BookingError::Forbidden(format!(
            "You are not the {} of this appointment",
            role
        )))
    }
}

fn ensure_participant(actor_id: Uuid, appointment: &Appointment) -> Result<(), BookingError> {
    if appointment.is_participant(actor_id) {
        Ok(())
    } else {
        Err(BookingError::Forbidden(
            "You are not a participant of this appointment".to_string(),
        ))
    }
}

async fn fetch_appointment(
    uow: &mut dyn UnitOfWork,
    id: Uuid,
) -> Result<Appointment, BookingError> {
    uow.get_appointment(id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Appointment {} not found", id)))
}

async fn service_summary(
    uow: &mut dyn UnitOfWork,
    service_id: Option<Uuid>,
) -> Result<Option<ServiceSummary>, BookingError> {
    let Some(service_id) = service_id else {
        return Ok(None);
    };
    Ok(uow.get_service(service_id).await?.map(|s| ServiceSummary {
        id: s.id,
        name: s.name,
    }))
}

/// Confirmation half of the "complete payment + confirm appointment" bundle.
///
/// Marks the appointment paid and moves it from `PENDING` to `CONFIRMED`.
/// An appointment the provider already confirmed only gets `is_paid`.
/// Returns the status change when one happened.
#[tracing::instrument(name = "confirm paid appointment", skip(uow))]
pub async fn confirm_paid_appointment(
    uow: &mut dyn UnitOfWork,
    appointment_id: Uuid,
) -> Result<Option<(AppointmentStatus, AppointmentStatus)>, BookingError> {
    let mut appointment = fetch_appointment(uow, appointment_id).await?;
    let from = appointment.status;
    appointment.is_paid = true;
    let change = match from {
        AppointmentStatus::Pending => {
            appointment.status = AppointmentStatus::Confirmed;
            Some((from, AppointmentStatus::Confirmed))
        }
        AppointmentStatus::Confirmed => None,
        _ => {
            tracing::warn!(
                "Payment completed for appointment {} which is already {}",
                appointment_id,
                from
            );
            None
        }
    };
    uow.update_appointment(&appointment).await?;
    Ok(change)
}

/// Checks that a payment may be linked to the appointment: it must exist,
/// belong to the payer, still hold its slot, be unpaid and have no other
/// payment in flight.
pub async fn validate_payable_appointment(
    uow: &mut dyn UnitOfWork,
    appointment_id: Uuid,
    payer_id: Uuid,
) -> Result<Appointment, BookingError> {
    let appointment = fetch_appointment(uow, appointment_id).await?;
    if appointment.requester_id != payer_id {
        return Err(BookingError::Forbidden(
            "You can only pay for your own appointments".to_string(),
        ));
    }
    if !appointment.status.is_active() {
        return Err(BookingError::ValidationError(format!(
            "Appointment is {} and cannot be paid for",
            appointment.status
        )));
    }
    if appointment.is_paid {
        return Err(BookingError::ValidationError(format!(
            "Appointment {} is already paid",
            appointment.id
        )));
    }
    if let Some(open) = uow.find_open_payment(appointment.id).await? {
        return Err(BookingError::ValidationError(format!(
            "Payment {} for appointment {} is still {}",
            open.id, appointment.id, open.status
        )));
    }
    Ok(appointment)
}

pub struct BookingManager {
    repository: Arc<dyn Repository>,
    notifier: Arc<dyn NotificationDispatcher>,
    commission_rate_pct: BigDecimal,
}

impl BookingManager {
    pub fn new(
        repository: Arc<dyn Repository>,
        notifier: Arc<dyn NotificationDispatcher>,
        commission_rate_pct: BigDecimal,
    ) -> Self {
        Self {
            repository,
            notifier,
            commission_rate_pct,
        }
    }

    #[tracing::instrument(name = "create appointment", skip(self, request), fields(provider_id = %request.provider_id, date = %request.date, time = %request.time))]
    pub async fn create_appointment(
        &self,
        request: NewAppointment,
    ) -> Result<AppointmentData, BookingError> {
        if request.requester_id == request.provider_id {
            return Err(BookingError::ValidationError(
                "You cannot book an appointment with yourself".to_string(),
            ));
        }

        let mut uow = self.repository.begin().await?;
        let service = match request.service_id {
            Some(service_id) => {
                let service = uow.get_service(service_id).await?.ok_or_else(|| {
                    BookingError::NotFound(format!("Service {} not found", service_id))
                })?;
                if service.provider_id != request.provider_id {
                    return Err(BookingError::ValidationError(
                        "Service does not belong to the selected provider".to_string(),
                    ));
                }
                Some(ServiceSummary {
                    id: service.id,
                    name: service.name,
                })
            }
            None => None,
        };

        if uow
            .find_active_appointment(request.provider_id, request.date, &request.time)
            .await?
            .is_some()
        {
            return Err(BookingError::SlotConflict(format!(
                "Provider is already booked on {} at {}",
                request.date, request.time
            )));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            requester_id: request.requester_id,
            provider_id: request.provider_id,
            service_id: request.service_id,
            date: request.date,
            time: request.time,
            status: AppointmentStatus::Pending,
            note: request.note,
            address: request.address,
            is_paid: false,
            created_on: Utc::now(),
            updated_on: None,
        };
        uow.insert_appointment(&appointment).await?;
        uow.commit().await?;
        tracing::info!("Appointment {} created", appointment.id);

        notify(
            self.notifier.as_ref(),
            NotificationEvent::NewBooking {
                appointment_id: appointment.id,
                requester_id: appointment.requester_id,
                provider_id: appointment.provider_id,
            },
        )
        .await;
        Ok(AppointmentData::new(appointment, service))
    }

    #[tracing::instrument(name = "fetch appointment", skip(self))]
    pub async fn get_appointment(
        &self,
        actor_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<AppointmentData, BookingError> {
        let mut uow = self.repository.begin().await?;
        let appointment = fetch_appointment(uow.as_mut(), appointment_id).await?;
        ensure_participant(actor_id, &appointment)?;
        let service = service_summary(uow.as_mut(), appointment.service_id).await?;
        Ok(AppointmentData::new(appointment, service))
    }

    #[tracing::instrument(name = "fetch appointment list", skip(self, filter))]
    pub async fn list_appointments(
        &self,
        actor_id: Uuid,
        filter: AppointmentListFilter,
    ) -> Result<Vec<AppointmentData>, BookingError> {
        let mut uow = self.repository.begin().await?;
        let appointments = uow
            .list_appointments(actor_id, filter.role, filter.status)
            .await?;
        let mut services: HashMap<Uuid, Option<ServiceSummary>> = HashMap::new();
        let mut data = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            let service = match appointment.service_id {
                Some(service_id) => match services.get(&service_id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let summary = service_summary(uow.as_mut(), Some(service_id)).await?;
                        services.insert(service_id, summary.clone());
                        summary
                    }
                },
                None => None,
            };
            data.push(AppointmentData::new(appointment, service));
        }
        Ok(data)
    }

    /// Re-requesting the current status succeeds without changes, provided
    /// the role could have made that change.
    #[tracing::instrument(name = "update appointment status", skip(self))]
    pub async fn update_status(
        &self,
        actor_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
        role: ActorRole,
    ) -> Result<AppointmentData, BookingError> {
        self.transition(actor_id, appointment_id, status, role, true)
            .await
    }

    /// Cancels a `PENDING` or `CONFIRMED` appointment.
    #[tracing::instrument(name = "cancel appointment", skip(self))]
    pub async fn cancel_appointment(
        &self,
        actor_id: Uuid,
        appointment_id: Uuid,
        role: ActorRole,
    ) -> Result<AppointmentData, BookingError> {
        self.transition(
            actor_id,
            appointment_id,
            AppointmentStatus::Cancelled,
            role,
            false,
        )
        .await
    }

    async fn transition(
        &self,
        actor_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
        role: ActorRole,
        allow_same_status: bool,
    ) -> Result<AppointmentData, BookingError> {
        let mut uow = self.repository.begin().await?;
        let mut appointment = fetch_appointment(uow.as_mut(), appointment_id).await?;
        authorize(actor_id, role, &appointment)?;

        let from = appointment.status;
        if from == status {
            if !allow_same_status || !can_target(status, role) {
                return Err(BookingError::InvalidTransition { from, to: status });
            }
            let service = service_summary(uow.as_mut(), appointment.service_id).await?;
            return Ok(AppointmentData::new(appointment, service));
        }
        validate_transition(from, status, role)?;

        appointment.status = status;
        uow.update_appointment(&appointment).await?;
        let service = service_summary(uow.as_mut(), appointment.service_id).await?;
        uow.commit().await?;
        tracing::info!("Appointment {} moved from {} to {}", appointment.id, from, status);

        notify(
            self.notifier.as_ref(),
            NotificationEvent::AppointmentStatusChanged {
                appointment_id: appointment.id,
                from,
                to: status,
            },
        )
        .await;
        Ok(AppointmentData::new(appointment, service))
    }

    #[tracing::instrument(name = "quote appointment", skip(self))]
    pub async fn quote_appointment(
        &self,
        actor_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<AppointmentQuoteData, BookingError> {
        let mut uow = self.repository.begin().await?;
        let appointment = fetch_appointment(uow.as_mut(), appointment_id).await?;
        ensure_participant(actor_id, &appointment)?;
        let service_id = appointment.service_id.ok_or_else(|| {
            BookingError::ValidationError("Appointment has no linked service".to_string())
        })?;
        let service = uow
            .get_service(service_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Service {} not found", service_id)))?;
        let tax_rate = uow
            .get_shop_tax_rate(appointment.provider_id)
            .await?
            .unwrap_or_else(BigDecimal::zero);

        Ok(AppointmentQuoteData {
            appointment_id: appointment.id,
            breakdown: breakdown(&service.price, &self.commission_rate_pct, &tax_rate),
            service: ServiceSummary {
                id: service.id,
                name: service.name,
            },
        })
    }
}
