// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, CreateAppointmentRequest};

// The bookable grid: every half hour from opening to closing, inclusive.
const SLOT_GRID_START: (u32, u32) = (8, 0);
const SLOT_GRID_END: (u32, u32) = (18, 0);
const SLOT_GRID_STEP_MINUTES: i64 = 30;

/// Durable appointment read/write model consumed by the booking flow.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError>;

    /// Number of slot-occupying appointments a clinic holds on `date`.
    async fn daily_count(&self, clinic_id: Uuid, date: NaiveDate)
        -> Result<i64, AppointmentError>;

    /// The slot grid for `date` minus slots already taken by slot-occupying
    /// appointments.
    async fn available_slots(
        &self,
        clinic_id: Uuid,
        service_id: Uuid,
        professional_id: Option<Uuid>,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, AppointmentError>;
}

pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    fn slot_grid() -> Vec<NaiveTime> {
        let start = NaiveTime::from_hms_opt(SLOT_GRID_START.0, SLOT_GRID_START.1, 0).unwrap();
        let end = NaiveTime::from_hms_opt(SLOT_GRID_END.0, SLOT_GRID_END.1, 0).unwrap();

        let mut slots = Vec::new();
        let mut slot = start;
        while slot <= end {
            slots.push(slot);
            slot += Duration::minutes(SLOT_GRID_STEP_MINUTES);
        }
        slots
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn create(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Creating appointment for clinic {} on {} at {}",
            request.clinic_id, request.scheduled_date, request.scheduled_time
        );

        if request.duration_minutes <= 0 {
            return Err(AppointmentError::ValidationError(
                "Appointment duration must be positive".to_string(),
            ));
        }
        if request.patient_name.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "Patient name must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let appointment_data = json!({
            "clinic_id": request.clinic_id,
            "patient_name": request.patient_name,
            "patient_phone": request.patient_phone,
            "patient_email": request.patient_email,
            "service_id": request.service_id,
            "professional_id": request.professional_id,
            "scheduled_date": request.scheduled_date.to_string(),
            "scheduled_time": request.scheduled_time.format("%H:%M:%S").to_string(),
            "duration_minutes": request.duration_minutes,
            "status": request.status.to_string(),
            "notes": request.notes,
            "source": request.source.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to create appointment".to_string(),
            ));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone()).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse created appointment: {}", e))
        })?;

        info!(
            "Appointment {} created for clinic {} ({} {})",
            appointment.id,
            appointment.clinic_id,
            appointment.scheduled_date,
            appointment.scheduled_time
        );

        Ok(appointment)
    }

    async fn daily_count(
        &self,
        clinic_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?clinic_id=eq.{}&scheduled_date=eq.{}&status=not.in.(cancelled,no_show)&select=id",
            clinic_id, date
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(result.len() as i64)
    }

    async fn available_slots(
        &self,
        clinic_id: Uuid,
        service_id: Uuid,
        professional_id: Option<Uuid>,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, AppointmentError> {
        debug!(
            "Fetching available slots for clinic {} service {} on {}",
            clinic_id, service_id, date
        );

        let mut path = format!(
            "/rest/v1/appointments?clinic_id=eq.{}&service_id=eq.{}&scheduled_date=eq.{}&status=not.in.(cancelled,no_show)&select=scheduled_time",
            clinic_id, service_id, date
        );
        if let Some(professional_id) = professional_id {
            path.push_str(&format!("&professional_id=eq.{}", professional_id));
        }

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let taken: Vec<NaiveTime> = result
            .iter()
            .filter_map(|row| row["scheduled_time"].as_str())
            .filter_map(|raw| NaiveTime::parse_from_str(raw, "%H:%M:%S").ok())
            .collect();

        let slots = Self::slot_grid()
            .into_iter()
            .filter(|slot| !taken.contains(slot))
            .collect();

        Ok(slots)
    }
}
