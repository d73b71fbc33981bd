use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub redis_url: Option<String>,
    pub min_advance_notice_hours: i64,
    pub max_advance_notice_days: i64,
    pub max_daily_appointments: i64,
    pub default_appointment_duration_minutes: i32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            redis_url: env::var("REDIS_URL").ok(),
            min_advance_notice_hours: int_from_env("MIN_ADVANCE_NOTICE_HOURS", 2),
            max_advance_notice_days: int_from_env("MAX_ADVANCE_NOTICE_DAYS", 90),
            max_daily_appointments: int_from_env("MAX_DAILY_APPOINTMENTS", 50),
            default_appointment_duration_minutes: int_from_env("DEFAULT_APPOINTMENT_DURATION", 30)
                as i32,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_cache_configured(&self) -> bool {
        self.redis_url.is_some()
    }
}

fn int_from_env(name: &str, default: i64) -> i64 {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid integer, using default {}", name, default);
            default
        }),
        Err(_) => default,
    }
}
