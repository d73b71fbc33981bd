// libs/catalog-cell/src/services/catalog.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CatalogError, Professional, Service};

/// Read model over a clinic's service catalog. Only active services are
/// returned; inactive entries stay queryable through the admin surface but
/// never reach the booking flow.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn find_by_clinic(
        &self,
        clinic_id: Uuid,
        category: Option<&str>,
    ) -> Result<Vec<Service>, CatalogError>;
}

/// Read model over a clinic's professionals. Only active professionals are
/// returned; whether they accept new patients is decided by the caller.
#[async_trait]
pub trait ProfessionalCatalog: Send + Sync {
    async fn find_by_clinic(&self, clinic_id: Uuid) -> Result<Vec<Professional>, CatalogError>;
}

pub struct SupabaseCatalog {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseCatalog {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }
}

#[async_trait]
impl ServiceCatalog for SupabaseCatalog {
    async fn find_by_clinic(
        &self,
        clinic_id: Uuid,
        category: Option<&str>,
    ) -> Result<Vec<Service>, CatalogError> {
        debug!("Fetching services for clinic {}", clinic_id);

        let mut path = format!(
            "/rest/v1/services?clinic_id=eq.{}&is_active=eq.true&order=name.asc",
            clinic_id
        );
        if let Some(category) = category {
            path.push_str(&format!("&category=eq.{}", category));
        }

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        let services: Vec<Service> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Service>, _>>()
            .map_err(|e| CatalogError::DatabaseError(format!("Failed to parse services: {}", e)))?;

        Ok(services)
    }
}

#[async_trait]
impl ProfessionalCatalog for SupabaseCatalog {
    async fn find_by_clinic(&self, clinic_id: Uuid) -> Result<Vec<Professional>, CatalogError> {
        debug!("Fetching professionals for clinic {}", clinic_id);

        let path = format!(
            "/rest/v1/professionals?clinic_id=eq.{}&is_active=eq.true&order=name.asc",
            clinic_id
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        let professionals: Vec<Professional> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Professional>, _>>()
            .map_err(|e| {
                CatalogError::DatabaseError(format!("Failed to parse professionals: {}", e))
            })?;

        Ok(professionals)
    }
}
