use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalog_cell::{ProfessionalCatalog, ServiceCatalog, SupabaseCatalog};
use shared_config::AppConfig;

fn test_config(supabase_url: String) -> AppConfig {
    AppConfig {
        supabase_url,
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_service_role_key: "test-service-role-key".to_string(),
        redis_url: None,
        min_advance_notice_hours: 2,
        max_advance_notice_days: 90,
        max_daily_appointments: 50,
        default_appointment_duration_minutes: 30,
    }
}

#[tokio::test]
async fn services_are_queried_active_only() {
    let server = MockServer::start().await;
    let clinic_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("clinic_id", format!("eq.{}", clinic_id)))
        .and(query_param("is_active", "eq.true"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": Uuid::new_v4(),
                "clinic_id": clinic_id,
                "name": "Dermatology consult",
                "description": "First evaluation",
                "category": "consultation",
                "duration_minutes": 30,
                "price": 150.0,
                "accepts_insurance": true,
                "is_active": true,
                "created_at": "2025-01-15T10:00:00Z",
                "updated_at": "2025-01-15T10:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let catalog = SupabaseCatalog::new(&test_config(server.uri()));
    let services = ServiceCatalog::find_by_clinic(&catalog, clinic_id, None)
        .await
        .expect("Query should succeed");

    assert_eq!(services.len(), 1);
    assert_eq!(services[0].name, "Dermatology consult");
    assert!(services[0].is_active);
}

#[tokio::test]
async fn services_can_be_narrowed_by_category() {
    let server = MockServer::start().await;
    let clinic_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("clinic_id", format!("eq.{}", clinic_id)))
        .and(query_param("is_active", "eq.true"))
        .and(query_param("category", "eq.aesthetics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = SupabaseCatalog::new(&test_config(server.uri()));
    let services = ServiceCatalog::find_by_clinic(&catalog, clinic_id, Some("aesthetics"))
        .await
        .unwrap();

    assert!(services.is_empty());
}

#[tokio::test]
async fn professionals_are_queried_active_only() {
    let server = MockServer::start().await;
    let clinic_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("clinic_id", format!("eq.{}", clinic_id)))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": Uuid::new_v4(),
                "clinic_id": clinic_id,
                "name": "Dr. Souza",
                "specialty": "Dermatology",
                "registration_number": "CRM-12345",
                "bio": null,
                "accepts_new_patients": true,
                "default_duration_minutes": 30,
                "is_active": true,
                "created_at": "2025-01-15T10:00:00Z",
                "updated_at": "2025-01-15T10:00:00Z"
            },
            {
                "id": Uuid::new_v4(),
                "clinic_id": clinic_id,
                "name": "Dr. Lima",
                "specialty": null,
                "registration_number": null,
                "bio": null,
                "accepts_new_patients": false,
                "default_duration_minutes": null,
                "is_active": true,
                "created_at": "2025-01-15T10:00:00Z",
                "updated_at": "2025-01-15T10:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let catalog = SupabaseCatalog::new(&test_config(server.uri()));
    let professionals = ProfessionalCatalog::find_by_clinic(&catalog, clinic_id)
        .await
        .expect("Query should succeed");

    // The store returns every active professional; accepting-new-patients
    // filtering belongs to the booking flow.
    assert_eq!(professionals.len(), 2);
    assert!(professionals.iter().any(|p| !p.accepts_new_patients));
}

#[tokio::test]
async fn supabase_errors_surface_as_catalog_errors() {
    let server = MockServer::start().await;
    let clinic_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database on fire"))
        .mount(&server)
        .await;

    let catalog = SupabaseCatalog::new(&test_config(server.uri()));
    let result = ServiceCatalog::find_by_clinic(&catalog, clinic_id, None).await;

    assert!(result.is_err());
}
