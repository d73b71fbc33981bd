#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentError, AppointmentStore, CreateAppointmentRequest,
};
use booking_flow_cell::{AppointmentFlowManager, BookingPolicy};
use catalog_cell::{CatalogError, Professional, ProfessionalCatalog, Service, ServiceCatalog};
use shared_cache::{CacheError, CacheStore};

/// Cache double backed by a plain map. TTLs are recorded rather than
/// enforced so tests can assert which expiration a write used.
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, (String, u64)>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn last_ttl(&self, key: &str) -> Option<u64> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl_seconds));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Appointment store double with scripted daily counts and slot grids.
pub struct InMemoryAppointmentStore {
    created: Mutex<Vec<Appointment>>,
    daily_counts: Mutex<HashMap<NaiveDate, i64>>,
    slots: Mutex<HashMap<NaiveDate, Vec<NaiveTime>>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            daily_counts: Mutex::new(HashMap::new()),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_daily_count(&self, date: NaiveDate, count: i64) {
        self.daily_counts.lock().unwrap().insert(date, count);
    }

    pub fn set_available_slots(&self, date: NaiveDate, slots: Vec<NaiveTime>) {
        self.slots.lock().unwrap().insert(date, slots);
    }

    pub fn created(&self) -> Vec<Appointment> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn create(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            clinic_id: request.clinic_id,
            patient_name: request.patient_name,
            patient_phone: request.patient_phone,
            patient_email: request.patient_email,
            service_id: request.service_id,
            professional_id: request.professional_id,
            scheduled_date: request.scheduled_date,
            scheduled_time: request.scheduled_time,
            duration_minutes: request.duration_minutes,
            status: request.status,
            notes: request.notes,
            source: request.source,
            created_at: now,
            updated_at: now,
        };

        self.created.lock().unwrap().push(appointment.clone());
        Ok(appointment)
    }

    async fn daily_count(
        &self,
        _clinic_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppointmentError> {
        Ok(self
            .daily_counts
            .lock()
            .unwrap()
            .get(&date)
            .copied()
            .unwrap_or(0))
    }

    async fn available_slots(
        &self,
        _clinic_id: Uuid,
        _service_id: Uuid,
        _professional_id: Option<Uuid>,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, AppointmentError> {
        Ok(self
            .slots
            .lock()
            .unwrap()
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }
}

/// Fixed catalog double.
pub struct StaticCatalog {
    services: Vec<Service>,
    professionals: Vec<Professional>,
}

impl StaticCatalog {
    pub fn new(services: Vec<Service>, professionals: Vec<Professional>) -> Self {
        Self {
            services,
            professionals,
        }
    }
}

#[async_trait]
impl ServiceCatalog for StaticCatalog {
    async fn find_by_clinic(
        &self,
        clinic_id: Uuid,
        category: Option<&str>,
    ) -> Result<Vec<Service>, CatalogError> {
        Ok(self
            .services
            .iter()
            .filter(|service| service.clinic_id == clinic_id && service.is_active)
            .filter(|service| match category {
                Some(category) => service.category.as_deref() == Some(category),
                None => true,
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfessionalCatalog for StaticCatalog {
    async fn find_by_clinic(&self, clinic_id: Uuid) -> Result<Vec<Professional>, CatalogError> {
        Ok(self
            .professionals
            .iter()
            .filter(|professional| professional.clinic_id == clinic_id && professional.is_active)
            .cloned()
            .collect())
    }
}

pub fn test_service(clinic_id: Uuid, name: &str, category: Option<&str>, is_active: bool) -> Service {
    let now = Utc::now();
    Service {
        id: Uuid::new_v4(),
        clinic_id,
        name: name.to_string(),
        description: None,
        category: category.map(|c| c.to_string()),
        duration_minutes: 30,
        price: Some(150.0),
        accepts_insurance: false,
        is_active,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_professional(
    clinic_id: Uuid,
    name: &str,
    accepts_new_patients: bool,
    is_active: bool,
) -> Professional {
    let now = Utc::now();
    Professional {
        id: Uuid::new_v4(),
        clinic_id,
        name: name.to_string(),
        specialty: Some("Dermatology".to_string()),
        registration_number: Some("CRM-12345".to_string()),
        bio: None,
        accepts_new_patients,
        default_duration_minutes: Some(30),
        is_active,
        created_at: now,
        updated_at: now,
    }
}

pub struct TestContext {
    pub manager: AppointmentFlowManager,
    pub cache: Arc<InMemoryCacheStore>,
    pub appointments: Arc<InMemoryAppointmentStore>,
}

pub fn flow_manager_with(
    policy: BookingPolicy,
    services: Vec<Service>,
    professionals: Vec<Professional>,
) -> TestContext {
    let cache = Arc::new(InMemoryCacheStore::new());
    let appointments = Arc::new(InMemoryAppointmentStore::new());
    let catalog = Arc::new(StaticCatalog::new(services, professionals));

    let manager = AppointmentFlowManager::new(
        cache.clone(),
        appointments.clone(),
        catalog.clone(),
        catalog,
        policy,
    );

    TestContext {
        manager,
        cache,
        appointments,
    }
}

pub fn flow_manager() -> TestContext {
    flow_manager_with(BookingPolicy::default(), Vec::new(), Vec::new())
}

pub fn patch(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}
