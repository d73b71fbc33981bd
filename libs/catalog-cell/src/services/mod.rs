pub mod catalog;

pub use catalog::{ProfessionalCatalog, ServiceCatalog, SupabaseCatalog};
