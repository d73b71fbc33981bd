// libs/booking-flow-cell/src/services/flow.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentSource, AppointmentStatus, AppointmentStore, CreateAppointmentRequest,
};
use catalog_cell::{Professional, ProfessionalCatalog, Service, ServiceCatalog};
use shared_cache::CacheStore;

use crate::models::{
    AvailableDate, BookingPolicy, ConfirmAppointmentRequest, FlowDescriptor, FlowError,
    FlowSession, FlowState, FlowSummary,
};
use crate::services::availability::AvailabilityService;

/// Active sessions live for an hour; every accepted transition refreshes the
/// clock.
const FLOW_TTL_SECONDS: u64 = 3600;

/// Sessions that reached a terminal state stay readable for a short grace
/// window before the cache drops them, so the conversational layer can show
/// the final state once.
const TERMINAL_GRACE_TTL_SECONDS: u64 = 300;

/// Walks a patient through the booking conversation: service, professional,
/// date, time, confirmation. Session state lives in the cache store keyed by
/// (clinic, patient phone); durable writes happen only on confirmation.
///
/// Constructed once at startup and shared by reference. Concurrent mutations
/// of the same session are last-write-wins; the conversational channel is
/// expected to deliver at most one in-flight request per patient.
pub struct AppointmentFlowManager {
    cache: Arc<dyn CacheStore>,
    appointments: Arc<dyn AppointmentStore>,
    services: Arc<dyn ServiceCatalog>,
    professionals: Arc<dyn ProfessionalCatalog>,
    availability: AvailabilityService,
    policy: BookingPolicy,
}

impl AppointmentFlowManager {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        appointments: Arc<dyn AppointmentStore>,
        services: Arc<dyn ServiceCatalog>,
        professionals: Arc<dyn ProfessionalCatalog>,
        policy: BookingPolicy,
    ) -> Self {
        let availability = AvailabilityService::new(Arc::clone(&appointments), policy.clone());

        Self {
            cache,
            appointments,
            services,
            professionals,
            availability,
            policy,
        }
    }

    /// Starts a fresh flow for the patient, overwriting any session already
    /// stored under the same key.
    pub async fn start_flow(
        &self,
        clinic_id: Uuid,
        patient_phone: &str,
        patient_name: &str,
    ) -> Result<FlowDescriptor, FlowError> {
        let flow_id = Self::flow_key(clinic_id, patient_phone);
        let now = Utc::now();

        let session = FlowSession {
            state: FlowState::Init,
            clinic_id,
            patient_phone: patient_phone.to_string(),
            patient_name: patient_name.to_string(),
            data: Map::new(),
            created_at: now,
            updated_at: now,
        };

        self.store_session(&flow_id, &session).await?;

        info!(
            "Appointment flow started: {} for clinic {} ({})",
            flow_id, clinic_id, patient_phone
        );

        Ok(Self::descriptor(&flow_id, &session))
    }

    /// The session descriptor, or `None` when no session exists or it has
    /// expired.
    pub async fn get_current_flow(
        &self,
        clinic_id: Uuid,
        patient_phone: &str,
    ) -> Result<Option<FlowDescriptor>, FlowError> {
        let flow_id = Self::flow_key(clinic_id, patient_phone);

        let session = match self.load_session(&flow_id).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        Ok(Some(Self::descriptor(&flow_id, &session)))
    }

    /// Moves the session to `target`, validating against the transition table
    /// and shallow-merging `patch` into the accumulated selections. The
    /// updated session is written back atomically with a refreshed TTL.
    pub async fn transition_to_state(
        &self,
        clinic_id: Uuid,
        patient_phone: &str,
        target: FlowState,
        patch: Map<String, Value>,
    ) -> Result<FlowDescriptor, FlowError> {
        let flow_id = Self::flow_key(clinic_id, patient_phone);

        let mut session = self
            .load_session(&flow_id)
            .await?
            .ok_or(FlowError::NoActiveFlow)?;

        let from = session.state;
        Self::apply_transition(&mut session, target, patch)?;
        self.store_session(&flow_id, &session).await?;

        info!(
            "Appointment flow transitioned: {} {} -> {}",
            flow_id, from, target
        );

        Ok(Self::descriptor(&flow_id, &session))
    }

    /// Active services offered by the clinic, optionally narrowed to a
    /// category.
    pub async fn get_available_services(
        &self,
        clinic_id: Uuid,
        category: Option<&str>,
    ) -> Result<Vec<Service>, FlowError> {
        let services = self.services.find_by_clinic(clinic_id, category).await?;

        info!(
            "Available services retrieved for clinic {}: {}",
            clinic_id,
            services.len()
        );

        Ok(services)
    }

    /// Active professionals currently accepting new patients.
    pub async fn get_available_professionals(
        &self,
        clinic_id: Uuid,
        service_id: Uuid,
    ) -> Result<Vec<Professional>, FlowError> {
        let professionals = self.professionals.find_by_clinic(clinic_id).await?;

        let available: Vec<Professional> = professionals
            .into_iter()
            .filter(|professional| professional.accepts_new_patients && professional.is_active)
            .collect();

        info!(
            "Available professionals retrieved for clinic {} service {}: {}",
            clinic_id,
            service_id,
            available.len()
        );

        Ok(available)
    }

    pub async fn get_available_dates(
        &self,
        clinic_id: Uuid,
        service_id: Uuid,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<AvailableDate>, FlowError> {
        self.availability
            .available_dates(clinic_id, service_id, professional_id, Utc::now())
            .await
    }

    pub async fn get_available_times(
        &self,
        clinic_id: Uuid,
        service_id: Uuid,
        professional_id: Option<Uuid>,
        date: chrono::NaiveDate,
    ) -> Result<Vec<chrono::NaiveTime>, FlowError> {
        self.availability
            .available_times(clinic_id, service_id, professional_id, date, Utc::now())
            .await
    }

    /// Creates the durable appointment and completes the flow. Only valid
    /// while the session sits in the confirmation step.
    pub async fn confirm_appointment(
        &self,
        clinic_id: Uuid,
        patient_phone: &str,
        request: ConfirmAppointmentRequest,
    ) -> Result<Appointment, FlowError> {
        let flow_id = Self::flow_key(clinic_id, patient_phone);

        let mut session = self
            .load_session(&flow_id)
            .await?
            .ok_or(FlowError::NoActiveFlow)?;

        if session.state != FlowState::Confirmation {
            warn!(
                "Confirmation attempted from state {} on {}",
                session.state, flow_id
            );
            return Err(FlowError::InvalidConfirmationState(session.state));
        }

        let create_request = CreateAppointmentRequest {
            clinic_id,
            patient_name: session.patient_name.clone(),
            patient_phone: session.patient_phone.clone(),
            patient_email: request.patient_email,
            service_id: request.service_id,
            professional_id: request.professional_id,
            scheduled_date: request.scheduled_date,
            scheduled_time: request.scheduled_time,
            duration_minutes: request
                .duration_minutes
                .unwrap_or(self.policy.default_duration_minutes),
            status: AppointmentStatus::Confirmed,
            notes: request.notes,
            source: AppointmentSource::Whatsapp,
        };

        let appointment = self.appointments.create(create_request).await?;

        let mut patch = Map::new();
        patch.insert("appointment_id".to_string(), json!(appointment.id));
        Self::apply_transition(&mut session, FlowState::Completed, patch)?;
        self.store_session(&flow_id, &session).await?;

        info!(
            "Appointment confirmed and created: {} for clinic {} ({})",
            appointment.id, clinic_id, patient_phone
        );

        Ok(appointment)
    }

    /// Cancels an in-progress flow, recording the reason. A patient can back
    /// out at any step, so cancellation is allowed from every non-terminal
    /// state; terminal sessions have no outgoing transitions and reject it.
    pub async fn cancel_flow(
        &self,
        clinic_id: Uuid,
        patient_phone: &str,
        reason: &str,
    ) -> Result<FlowDescriptor, FlowError> {
        let flow_id = Self::flow_key(clinic_id, patient_phone);

        let mut session = self
            .load_session(&flow_id)
            .await?
            .ok_or(FlowError::NoActiveFlow)?;

        if session.state.is_terminal() {
            warn!("Cancellation attempted on terminal flow {}", flow_id);
            return Err(FlowError::InvalidTransition {
                from: session.state,
                to: FlowState::Cancelled,
            });
        }

        let mut patch = Map::new();
        patch.insert("cancellation_reason".to_string(), json!(reason));
        patch.insert("cancelled_at".to_string(), json!(Utc::now().to_rfc3339()));

        session.state = FlowState::Cancelled;
        session.merge_data(patch);
        session.updated_at = Utc::now();
        self.store_session(&flow_id, &session).await?;

        info!(
            "Appointment flow cancelled: {} for clinic {} (reason: {})",
            flow_id, clinic_id, reason
        );

        Ok(Self::descriptor(&flow_id, &session))
    }

    /// Derived view of the session: state, fixed progress percentage, next
    /// steps, and the accumulated selections.
    pub async fn get_flow_summary(
        &self,
        clinic_id: Uuid,
        patient_phone: &str,
    ) -> Result<Option<FlowSummary>, FlowError> {
        let flow_id = Self::flow_key(clinic_id, patient_phone);

        let session = match self.load_session(&flow_id).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        Ok(Some(FlowSummary {
            flow_id,
            state: session.state,
            progress: session.state.progress(),
            next_steps: Self::next_steps(session.state),
            data: session.data,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }))
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    fn flow_key(clinic_id: Uuid, patient_phone: &str) -> String {
        format!("appointment_flow:{}:{}", clinic_id, patient_phone)
    }

    fn next_steps(state: FlowState) -> Vec<String> {
        state.next_steps().iter().map(|s| s.to_string()).collect()
    }

    fn descriptor(flow_id: &str, session: &FlowSession) -> FlowDescriptor {
        FlowDescriptor {
            flow_id: flow_id.to_string(),
            state: session.state,
            next_steps: Self::next_steps(session.state),
            data: session.data.clone(),
        }
    }

    /// Single enforcement point for the transition table. Mutates the session
    /// in place; the caller persists it as one atomic write.
    fn apply_transition(
        session: &mut FlowSession,
        target: FlowState,
        patch: Map<String, Value>,
    ) -> Result<(), FlowError> {
        if !session.state.can_transition_to(target) {
            warn!(
                "Invalid flow transition attempted: {} -> {}",
                session.state, target
            );
            return Err(FlowError::InvalidTransition {
                from: session.state,
                to: target,
            });
        }

        session.state = target;
        session.merge_data(patch);
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn load_session(&self, flow_id: &str) -> Result<Option<FlowSession>, FlowError> {
        debug!("Loading flow session {}", flow_id);

        let raw = match self.cache.get(flow_id).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let session: FlowSession = serde_json::from_str(&raw)?;
        Ok(Some(session))
    }

    async fn store_session(&self, flow_id: &str, session: &FlowSession) -> Result<(), FlowError> {
        let ttl = if session.state.is_terminal() {
            TERMINAL_GRACE_TTL_SECONDS
        } else {
            FLOW_TTL_SECONDS
        };

        let raw = serde_json::to_string(session)?;
        self.cache.set(flow_id, &raw, ttl).await?;
        Ok(())
    }
}
