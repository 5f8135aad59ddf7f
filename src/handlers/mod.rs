pub mod suppliers;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use slog::Logger;

use crate::commands::suppliers::{
    CreateSupplierHandler, UpdateSupplierHandler, CREATE_SUPPLIER, UPDATE_SUPPLIER,
};
use crate::commands::CommandBus;
use crate::events::{EventBus, SupplierEventLogger, SUPPLIER_CREATED, SUPPLIER_UPDATED};
use crate::queries::supplier_queries::{
    DetailSupplierHandler, ListSuppliersHandler, SearchSuppliersHandler, DETAIL_SUPPLIER,
    LIST_SUPPLIERS, SEARCH_SUPPLIERS,
};
use crate::queries::QueryBus;
use crate::repositories::{SeaOrmSupplierRepository, SupplierRepository};
use crate::services::suppliers::SupplierService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub suppliers: Arc<SupplierService>,
}

impl AppServices {
    /// Wires the repository, the buses and all five supplier handlers into
    /// the facade. Registration happens here, before anything is shared.
    pub fn new(db: Arc<DatabaseConnection>, logger: Logger) -> Self {
        let repository: Arc<dyn SupplierRepository> =
            Arc::new(SeaOrmSupplierRepository::new(db));

        let mut event_bus = EventBus::new();
        let event_logger = Arc::new(SupplierEventLogger);
        event_bus.register(SUPPLIER_CREATED, event_logger.clone());
        event_bus.register(SUPPLIER_UPDATED, event_logger);

        let mut command_bus = CommandBus::new(Arc::new(event_bus));
        command_bus.register(
            CREATE_SUPPLIER,
            CreateSupplierHandler::new(repository.clone()),
        );
        command_bus.register(
            UPDATE_SUPPLIER,
            UpdateSupplierHandler::new(repository.clone()),
        );

        let mut query_bus = QueryBus::new();
        query_bus.register(
            DETAIL_SUPPLIER,
            DetailSupplierHandler::new(repository.clone()),
        );
        query_bus.register(LIST_SUPPLIERS, ListSuppliersHandler::new(repository.clone()));
        query_bus.register(SEARCH_SUPPLIERS, SearchSuppliersHandler::new(repository));

        let suppliers = Arc::new(SupplierService::new(
            Arc::new(command_bus),
            Arc::new(query_bus),
            logger.new(slog::o!("component" => "supplier_service")),
        ));

        Self { suppliers }
    }
}
