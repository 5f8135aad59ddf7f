use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::commands::{CommandHandler, CommandOutput};
use crate::errors::ServiceError;
use crate::events::{DomainEvent, SUPPLIER_UPDATED};
use crate::models::supplier::Supplier;
use crate::models::EntityId;
use crate::repositories::SupplierRepository;

lazy_static! {
    static ref SUPPLIER_UPDATES: IntCounter = IntCounter::new(
        "supplier_updates_total",
        "Total number of suppliers updated"
    )
    .expect("metric can be created");
    static ref SUPPLIER_UPDATE_FAILURES: IntCounter = IntCounter::new(
        "supplier_update_failures_total",
        "Total number of failed supplier updates"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSupplierCommand {
    pub id: String,
    pub name: String,
    pub telephone: String,
    pub social_media: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateSupplierResult {
    pub id: String,
    pub name: String,
    pub telephone: String,
    pub social_media: String,
    pub is_active: bool,
}

/// Replaces every mutable field of an existing supplier.
pub struct UpdateSupplierHandler {
    repository: Arc<dyn SupplierRepository>,
}

impl UpdateSupplierHandler {
    pub fn new(repository: Arc<dyn SupplierRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<UpdateSupplierCommand> for UpdateSupplierHandler {
    type Result = UpdateSupplierResult;

    #[instrument(skip(self, command))]
    async fn execute(
        &self,
        command: UpdateSupplierCommand,
    ) -> Result<CommandOutput<Self::Result>, ServiceError> {
        let id = EntityId::parse(&command.id).map_err(|e| {
            SUPPLIER_UPDATE_FAILURES.inc();
            e
        })?;

        if !self.repository.exists(&id).await? {
            SUPPLIER_UPDATE_FAILURES.inc();
            return Err(ServiceError::NotFound("Supplier not found".to_string()));
        }

        let supplier = Supplier::new(
            id,
            command.name,
            command.telephone,
            command.social_media,
            command.is_active,
        )
        .map_err(|e| {
            SUPPLIER_UPDATE_FAILURES.inc();
            error!("Invalid supplier input: {}", e);
            e
        })?;

        self.repository.update(&id, &supplier).await.map_err(|e| {
            SUPPLIER_UPDATE_FAILURES.inc();
            error!("Failed to update supplier {}: {}", id, e);
            e
        })?;

        SUPPLIER_UPDATES.inc();
        info!("Supplier updated: {}", id);

        Ok(CommandOutput::new(
            UpdateSupplierResult {
                id: supplier.id().to_string(),
                name: supplier.name().to_string(),
                telephone: supplier.telephone().to_string(),
                social_media: supplier.social_media().to_string(),
                is_active: supplier.is_active(),
            },
            vec![DomainEvent::new(supplier.id().to_string(), SUPPLIER_UPDATED)],
        ))
    }
}
