use std::sync::Arc;

use slog::{info, Logger};
use tracing::instrument;

use crate::commands::suppliers::{
    CreateSupplierCommand, CreateSupplierResult, UpdateSupplierCommand, UpdateSupplierResult,
    CREATE_SUPPLIER, UPDATE_SUPPLIER,
};
use crate::commands::CommandBus;
use crate::errors::ServiceError;
use crate::queries::supplier_queries::{
    DetailSupplierQuery, ListSuppliersQuery, SearchSuppliersQuery, SearchSuppliersResult,
    SupplierDto, DETAIL_SUPPLIER, LIST_SUPPLIERS, SEARCH_SUPPLIERS,
};
use crate::queries::QueryBus;

/// Service for managing suppliers
///
/// Thin facade over the two buses so callers get typed methods instead of
/// identifier strings.
#[derive(Clone)]
pub struct SupplierService {
    command_bus: Arc<CommandBus>,
    query_bus: Arc<QueryBus>,
    logger: Logger,
}

impl SupplierService {
    pub fn new(command_bus: Arc<CommandBus>, query_bus: Arc<QueryBus>, logger: Logger) -> Self {
        Self {
            command_bus,
            query_bus,
            logger,
        }
    }

    /// Creates a new supplier
    #[instrument(skip(self, command))]
    pub async fn create_supplier(
        &self,
        command: CreateSupplierCommand,
    ) -> Result<CreateSupplierResult, ServiceError> {
        let result: CreateSupplierResult =
            self.command_bus.execute(CREATE_SUPPLIER, command).await?;
        info!(self.logger, "Supplier created"; "supplier_id" => result.supplier_id.as_str());
        Ok(result)
    }

    /// Updates an existing supplier
    #[instrument(skip(self, command))]
    pub async fn update_supplier(
        &self,
        command: UpdateSupplierCommand,
    ) -> Result<UpdateSupplierResult, ServiceError> {
        let result: UpdateSupplierResult =
            self.command_bus.execute(UPDATE_SUPPLIER, command).await?;
        info!(self.logger, "Supplier updated"; "supplier_id" => result.id.as_str());
        Ok(result)
    }

    /// Gets a supplier by ID
    #[instrument(skip(self))]
    pub async fn detail_supplier(&self, supplier_id: &str) -> Result<SupplierDto, ServiceError> {
        self.query_bus
            .execute(
                DETAIL_SUPPLIER,
                DetailSupplierQuery {
                    supplier_id: supplier_id.to_string(),
                },
            )
            .await
    }

    /// Lists all suppliers
    #[instrument(skip(self))]
    pub async fn list_suppliers(&self) -> Result<Vec<SupplierDto>, ServiceError> {
        self.query_bus
            .execute(LIST_SUPPLIERS, ListSuppliersQuery)
            .await
    }

    /// Searches suppliers with pagination, sorting and filtering
    #[instrument(skip(self, query))]
    pub async fn search_suppliers(
        &self,
        query: SearchSuppliersQuery,
    ) -> Result<SearchSuppliersResult, ServiceError> {
        let result: SearchSuppliersResult =
            self.query_bus.execute(SEARCH_SUPPLIERS, query).await?;
        info!(self.logger, "Suppliers searched"; "total" => result.total, "page" => result.current_page);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::suppliers::CreateSupplierHandler;
    use crate::events::EventBus;
    use crate::queries::supplier_queries::DetailSupplierHandler;
    use crate::repositories::MockSupplierRepository;
    use assert_matches::assert_matches;

    fn discard_logger() -> Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    #[tokio::test]
    async fn create_goes_through_the_command_bus() {
        let mut repository = MockSupplierRepository::new();
        repository.expect_insert().times(1).returning(|_| Ok(()));
        let repository: Arc<dyn crate::repositories::SupplierRepository> = Arc::new(repository);

        let mut command_bus = CommandBus::new(Arc::new(EventBus::new()));
        command_bus.register(CREATE_SUPPLIER, CreateSupplierHandler::new(repository));

        let service = SupplierService::new(
            Arc::new(command_bus),
            Arc::new(QueryBus::new()),
            discard_logger(),
        );

        let result = service
            .create_supplier(CreateSupplierCommand {
                name: "Acme Tools".into(),
                telephone: "555-0199".into(),
                social_media: "@acmetools".into(),
            })
            .await
            .unwrap();

        assert_eq!(result.name, "Acme Tools");
        assert!(result.is_active);
    }

    #[tokio::test]
    async fn detail_passes_not_found_through() {
        let mut repository = MockSupplierRepository::new();
        repository.expect_find_by_id().returning(|_| Ok(None));
        let repository: Arc<dyn crate::repositories::SupplierRepository> = Arc::new(repository);

        let mut query_bus = QueryBus::new();
        query_bus.register(DETAIL_SUPPLIER, DetailSupplierHandler::new(repository));

        let service = SupplierService::new(
            Arc::new(CommandBus::new(Arc::new(EventBus::new()))),
            Arc::new(query_bus),
            discard_logger(),
        );

        let err = service
            .detail_supplier(&crate::models::EntityId::new().to_string())
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::NotFound(msg) if msg == "Supplier not found");
    }
}
