pub mod create_supplier_command;
pub mod update_supplier_command;

pub use create_supplier_command::{
    CreateSupplierCommand, CreateSupplierHandler, CreateSupplierResult,
};
pub use update_supplier_command::{
    UpdateSupplierCommand, UpdateSupplierHandler, UpdateSupplierResult,
};

/// Registry identifiers the supplier command handlers are dispatched under.
pub const CREATE_SUPPLIER: &str = "suppliers.create";
pub const UPDATE_SUPPLIER: &str = "suppliers.update";
