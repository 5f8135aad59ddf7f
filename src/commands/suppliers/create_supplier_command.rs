use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::commands::{CommandHandler, CommandOutput};
use crate::errors::ServiceError;
use crate::events::{DomainEvent, SUPPLIER_CREATED};
use crate::models::supplier::Supplier;
use crate::models::EntityId;
use crate::repositories::SupplierRepository;

lazy_static! {
    static ref SUPPLIER_CREATIONS: IntCounter = IntCounter::new(
        "supplier_creations_total",
        "Total number of suppliers created"
    )
    .expect("metric can be created");
    static ref SUPPLIER_CREATION_FAILURES: IntCounter = IntCounter::new(
        "supplier_creation_failures_total",
        "Total number of failed supplier creations"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSupplierCommand {
    pub name: String,
    pub telephone: String,
    pub social_media: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSupplierResult {
    pub supplier_id: String,
    pub name: String,
    pub telephone: String,
    pub social_media: String,
    pub is_active: bool,
}

/// Creates a new active supplier under a freshly minted identifier.
pub struct CreateSupplierHandler {
    repository: Arc<dyn SupplierRepository>,
}

impl CreateSupplierHandler {
    pub fn new(repository: Arc<dyn SupplierRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<CreateSupplierCommand> for CreateSupplierHandler {
    type Result = CreateSupplierResult;

    #[instrument(skip(self, command))]
    async fn execute(
        &self,
        command: CreateSupplierCommand,
    ) -> Result<CommandOutput<Self::Result>, ServiceError> {
        let supplier = Supplier::new(
            EntityId::new(),
            command.name,
            command.telephone,
            command.social_media,
            true,
        )
        .map_err(|e| {
            SUPPLIER_CREATION_FAILURES.inc();
            error!("Invalid supplier input: {}", e);
            e
        })?;

        self.repository.insert(&supplier).await.map_err(|e| {
            SUPPLIER_CREATION_FAILURES.inc();
            error!("Failed to create supplier: {}", e);
            e
        })?;

        SUPPLIER_CREATIONS.inc();
        info!("Supplier created: {}", supplier.id());

        Ok(CommandOutput::new(
            CreateSupplierResult {
                supplier_id: supplier.id().to_string(),
                name: supplier.name().to_string(),
                telephone: supplier.telephone().to_string(),
                social_media: supplier.social_media().to_string(),
                is_active: supplier.is_active(),
            },
            vec![DomainEvent::new(
                supplier.id().to_string(),
                SUPPLIER_CREATED,
            )],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockSupplierRepository;
    use assert_matches::assert_matches;

    fn valid_command() -> CreateSupplierCommand {
        CreateSupplierCommand {
            name: "Acme Tools".into(),
            telephone: "555-0199".into(),
            social_media: "@acmetools".into(),
        }
    }

    #[tokio::test]
    async fn creates_an_active_supplier_and_emits_one_event() {
        let mut repository = MockSupplierRepository::new();
        repository.expect_insert().times(1).returning(|_| Ok(()));
        let handler = CreateSupplierHandler::new(Arc::new(repository));

        let output = handler.execute(valid_command()).await.unwrap();

        assert!(output.result.is_active);
        assert_eq!(output.result.name, "Acme Tools");
        assert_eq!(output.result.telephone, "555-0199");
        assert_eq!(output.result.social_media, "@acmetools");
        assert_eq!(output.events.len(), 1);
        assert_eq!(output.events[0].event_name, SUPPLIER_CREATED);
        assert_eq!(output.events[0].aggregate_id, output.result.supplier_id);
    }

    #[tokio::test]
    async fn rejects_a_name_shorter_than_three_characters() {
        let handler = CreateSupplierHandler::new(Arc::new(MockSupplierRepository::new()));

        let err = handler
            .execute(CreateSupplierCommand {
                name: "ab".into(),
                ..valid_command()
            })
            .await
            .unwrap_err();

        assert_matches!(
            err,
            ServiceError::ValidationError(msg)
                if msg == "Supplier name must be at least 3 characters"
        );
    }

    #[tokio::test]
    async fn surfaces_repository_failures() {
        let mut repository = MockSupplierRepository::new();
        repository
            .expect_insert()
            .returning(|_| Err(ServiceError::db_error("Error saving supplier")));
        let handler = CreateSupplierHandler::new(Arc::new(repository));

        let err = handler.execute(valid_command()).await.unwrap_err();

        assert_matches!(err, ServiceError::DatabaseError(_));
        assert!(err.to_string().contains("Error saving supplier"));
    }
}
