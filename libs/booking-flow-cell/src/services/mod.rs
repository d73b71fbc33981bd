pub mod availability;
pub mod flow;

pub use availability::AvailabilityService;
pub use flow::AppointmentFlowManager;
