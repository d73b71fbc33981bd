// libs/booking-flow-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use shared_cache::CacheError;
use shared_config::AppConfig;

// ==============================================================================
// FLOW STATE MACHINE
// ==============================================================================

/// The steps a patient walks through while booking over the conversational
/// channel. Professional selection is optional; a flow may go straight from
/// service selection to date selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Init,
    ServiceSelection,
    ProfessionalSelection,
    DateSelection,
    TimeSelection,
    Confirmation,
    Completed,
    Cancelled,
}

impl FlowState {
    /// The states reachable from this one. Completed and Cancelled are
    /// terminal.
    pub fn valid_transitions(&self) -> &'static [FlowState] {
        match self {
            FlowState::Init => &[FlowState::ServiceSelection],
            FlowState::ServiceSelection => {
                &[FlowState::ProfessionalSelection, FlowState::DateSelection]
            }
            FlowState::ProfessionalSelection => &[FlowState::DateSelection],
            FlowState::DateSelection => &[FlowState::TimeSelection],
            FlowState::TimeSelection => &[FlowState::Confirmation],
            FlowState::Confirmation => &[FlowState::Completed, FlowState::Cancelled],
            FlowState::Completed => &[],
            FlowState::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: FlowState) -> bool {
        self.valid_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Completed | FlowState::Cancelled)
    }

    pub fn next_steps(&self) -> &'static [&'static str] {
        match self {
            FlowState::Init => &["Select a service"],
            FlowState::ServiceSelection => &["Select a professional", "Select a date"],
            FlowState::ProfessionalSelection => &["Select a date"],
            FlowState::DateSelection => &["Select a time"],
            FlowState::TimeSelection => &["Confirm the appointment"],
            FlowState::Confirmation => &["Confirm", "Cancel"],
            FlowState::Completed => &["Appointment booked"],
            FlowState::Cancelled => &["Booking cancelled"],
        }
    }

    /// How far through the booking this state is, as a fixed percentage.
    pub fn progress(&self) -> u8 {
        match self {
            FlowState::Init => 0,
            FlowState::ServiceSelection => 20,
            FlowState::ProfessionalSelection => 40,
            FlowState::DateSelection => 60,
            FlowState::TimeSelection => 80,
            FlowState::Confirmation => 90,
            FlowState::Completed => 100,
            FlowState::Cancelled => 0,
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowState::Init => write!(f, "init"),
            FlowState::ServiceSelection => write!(f, "service_selection"),
            FlowState::ProfessionalSelection => write!(f, "professional_selection"),
            FlowState::DateSelection => write!(f, "date_selection"),
            FlowState::TimeSelection => write!(f, "time_selection"),
            FlowState::Confirmation => write!(f, "confirmation"),
            FlowState::Completed => write!(f, "completed"),
            FlowState::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// FLOW SESSION MODELS
// ==============================================================================

/// The cache-resident session tracking one patient's booking conversation.
/// One session exists per (clinic, patient phone) pair; starting a new flow
/// overwrites any previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSession {
    pub state: FlowState,
    pub clinic_id: Uuid,
    pub patient_phone: String,
    pub patient_name: String,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlowSession {
    /// Shallow-merges `patch` into the accumulated selections; new keys
    /// overwrite old ones.
    pub fn merge_data(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.data.insert(key, value);
        }
    }
}

/// What callers of the flow engine see: the session key, its state, the
/// accumulated selections, and human-readable next steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDescriptor {
    pub flow_id: String,
    pub state: FlowState,
    pub next_steps: Vec<String>,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummary {
    pub flow_id: String,
    pub state: FlowState,
    pub progress: u8,
    pub next_steps: Vec<String>,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A calendar day a patient can still book, with remaining capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDate {
    pub date: NaiveDate,
    pub day_name: String,
    pub available_slots: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmAppointmentRequest {
    pub service_id: Uuid,
    pub professional_id: Option<Uuid>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub patient_email: Option<String>,
    pub notes: Option<String>,
}

// ==============================================================================
// BOOKING POLICY
// ==============================================================================

/// Clinic scheduling policy applied when computing availability.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub min_advance_notice_hours: i64,
    pub max_advance_notice_days: i64,
    pub max_daily_appointments: i64,
    pub default_duration_minutes: i32,
    pub working_days: Vec<Weekday>,
}

impl BookingPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_advance_notice_hours: config.min_advance_notice_hours,
            max_advance_notice_days: config.max_advance_notice_days,
            max_daily_appointments: config.max_daily_appointments,
            default_duration_minutes: config.default_appointment_duration_minutes,
            ..Self::default()
        }
    }

    pub fn is_working_day(&self, weekday: Weekday) -> bool {
        self.working_days.contains(&weekday)
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            min_advance_notice_hours: 2,
            max_advance_notice_days: 90,
            max_daily_appointments: 50,
            default_duration_minutes: 30,
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("No active flow found")]
    NoActiveFlow,

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: FlowState, to: FlowState },

    #[error("Cannot confirm appointment from state: {0}")]
    InvalidConfirmationState(FlowState),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Appointment error: {0}")]
    Appointment(#[from] appointment_cell::AppointmentError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog_cell::CatalogError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(FlowState::Completed.valid_transitions().is_empty());
        assert!(FlowState::Cancelled.valid_transitions().is_empty());
        assert!(FlowState::Completed.is_terminal());
        assert!(FlowState::Cancelled.is_terminal());
    }

    #[test]
    fn service_selection_branches() {
        assert!(FlowState::ServiceSelection.can_transition_to(FlowState::ProfessionalSelection));
        assert!(FlowState::ServiceSelection.can_transition_to(FlowState::DateSelection));
        assert!(!FlowState::ServiceSelection.can_transition_to(FlowState::TimeSelection));
    }

    #[test]
    fn progress_is_monotonic_along_the_happy_path() {
        let path = [
            FlowState::Init,
            FlowState::ServiceSelection,
            FlowState::ProfessionalSelection,
            FlowState::DateSelection,
            FlowState::TimeSelection,
            FlowState::Confirmation,
            FlowState::Completed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].progress() < pair[1].progress());
        }
        assert_eq!(FlowState::Cancelled.progress(), 0);
    }

    #[test]
    fn merge_data_is_shallow_and_overwrites() {
        let mut session = FlowSession {
            state: FlowState::ServiceSelection,
            clinic_id: Uuid::new_v4(),
            patient_phone: "+5511999990000".to_string(),
            patient_name: "Ana".to_string(),
            data: Map::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut patch = Map::new();
        patch.insert("service_id".to_string(), Value::from("svc1"));
        session.merge_data(patch);

        let mut patch = Map::new();
        patch.insert("service_id".to_string(), Value::from("svc2"));
        patch.insert("date".to_string(), Value::from("2025-06-03"));
        session.merge_data(patch);

        assert_eq!(session.data["service_id"], Value::from("svc2"));
        assert_eq!(session.data["date"], Value::from("2025-06-03"));
    }
}
