// Core services
pub mod suppliers;

pub use suppliers::SupplierService;
