use super::schemas::{Appointment, AppointmentStatus, ServiceListing};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct AppointmentModel {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub note: Option<String>,
    pub address: Option<String>,
    pub is_paid: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl AppointmentModel {
    pub fn into_schema(self) -> Appointment {
        Appointment {
            id: self.id,
            requester_id: self.requester_id,
            provider_id: self.provider_id,
            service_id: self.service_id,
            date: self.date,
            time: self.time,
            status: self.status,
            note: self.note,
            address: self.address,
            is_paid: self.is_paid,
            created_on: self.created_on,
            updated_on: self.updated_on,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ServiceListingModel {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}

impl ServiceListingModel {
    pub fn into_schema(self) -> ServiceListing {
        ServiceListing {
            id: self.id,
            provider_id: self.provider_id,
            name: self.name,
            price: self.price,
        }
    }
}
