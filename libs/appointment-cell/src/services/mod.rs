pub mod store;

pub use store::{AppointmentStore, SupabaseAppointmentStore};
