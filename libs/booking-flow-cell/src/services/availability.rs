// libs/booking-flow-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use appointment_cell::AppointmentStore;

use crate::models::{day_name, AvailableDate, BookingPolicy, FlowError};

/// Computes bookable dates and times against the clinic's scheduling policy.
///
/// `now` is always an explicit argument so that advance-notice windows are
/// evaluated against the same instant throughout one computation.
pub struct AvailabilityService {
    appointments: Arc<dyn AppointmentStore>,
    policy: BookingPolicy,
}

impl AvailabilityService {
    pub fn new(appointments: Arc<dyn AppointmentStore>, policy: BookingPolicy) -> Self {
        Self {
            appointments,
            policy,
        }
    }

    /// Calendar days still open for booking, from the minimum advance notice
    /// up to the maximum advance window. The current day is never offered,
    /// non-operating days are skipped, and days at the daily cap are dropped.
    pub async fn available_dates(
        &self,
        clinic_id: Uuid,
        service_id: Uuid,
        professional_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AvailableDate>, FlowError> {
        let window_start = now + Duration::hours(self.policy.min_advance_notice_hours);
        let window_end = now + Duration::days(self.policy.max_advance_notice_days);
        let today = now.date_naive();

        let mut available_dates = Vec::new();
        let mut day = window_start.date_naive();

        while day <= window_end.date_naive() {
            if day > today && self.policy.is_working_day(day.weekday()) {
                let booked = self.appointments.daily_count(clinic_id, day).await?;

                if booked < self.policy.max_daily_appointments {
                    available_dates.push(AvailableDate {
                        date: day,
                        day_name: day_name(day.weekday()).to_string(),
                        available_slots: self.policy.max_daily_appointments - booked,
                    });
                }
            }

            day += Duration::days(1);
        }

        debug!(
            "Available dates retrieved for clinic {} service {} professional {:?}: {}",
            clinic_id,
            service_id,
            professional_id,
            available_dates.len()
        );

        Ok(available_dates)
    }

    /// Open slots on `date`, excluding any slot that starts inside the
    /// minimum advance-notice window.
    pub async fn available_times(
        &self,
        clinic_id: Uuid,
        service_id: Uuid,
        professional_id: Option<Uuid>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<NaiveTime>, FlowError> {
        let slots = self
            .appointments
            .available_slots(clinic_id, service_id, professional_id, date)
            .await?;

        let cutoff = now + Duration::hours(self.policy.min_advance_notice_hours);
        let times: Vec<NaiveTime> = slots
            .into_iter()
            .filter(|slot| date.and_time(*slot).and_utc() >= cutoff)
            .collect();

        debug!(
            "Available times retrieved for clinic {} service {} on {}: {}",
            clinic_id,
            service_id,
            date,
            times.len()
        );

        Ok(times)
    }
}
