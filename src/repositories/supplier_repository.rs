use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::error;

use crate::entities::supplier::{self, Entity as SupplierEntity};
use crate::errors::ServiceError;
use crate::models::supplier::Supplier;
use crate::models::EntityId;
use crate::repositories::{SupplierRepository, SupplierSearchParams, SupplierSearchResult};
use crate::search::{SearchResult, SortDirection};

/// Columns a search may sort by.
pub const SORTABLE_FIELDS: &[&str] = &["name", "created_at", "updated_at"];

/// sea-orm backed supplier store, usable against Postgres and SQLite.
pub struct SeaOrmSupplierRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSupplierRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_domain(model: supplier::Model) -> Result<Supplier, ServiceError> {
    Supplier::new(
        EntityId::from(model.id),
        model.name,
        model.telephone,
        model.social_media,
        model.is_active,
    )
}

fn sort_column(field: &str) -> Option<supplier::Column> {
    match field {
        "name" => Some(supplier::Column::Name),
        "created_at" => Some(supplier::Column::CreatedAt),
        "updated_at" => Some(supplier::Column::UpdatedAt),
        _ => None,
    }
}

#[async_trait]
impl SupplierRepository for SeaOrmSupplierRepository {
    async fn insert(&self, supplier: &Supplier) -> Result<(), ServiceError> {
        let model = supplier::ActiveModel {
            id: Set(supplier.id().as_uuid()),
            name: Set(supplier.name().to_string()),
            telephone: Set(supplier.telephone().to_string()),
            social_media: Set(supplier.social_media().to_string()),
            is_active: Set(supplier.is_active()),
            ..Default::default()
        };

        model.insert(&*self.db).await.map_err(|e| {
            error!("Failed to save supplier {}: {}", supplier.id(), e);
            ServiceError::db_error("Error saving supplier")
        })?;

        Ok(())
    }

    async fn update(&self, id: &EntityId, supplier: &Supplier) -> Result<(), ServiceError> {
        let existing = SupplierEntity::find_by_id(id.as_uuid())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Supplier not found".to_string()))?;

        let mut model: supplier::ActiveModel = existing.into();
        model.name = Set(supplier.name().to_string());
        model.telephone = Set(supplier.telephone().to_string());
        model.social_media = Set(supplier.social_media().to_string());
        model.is_active = Set(supplier.is_active());

        model.update(&*self.db).await.map_err(|e| {
            error!("Failed to update supplier {}: {}", id, e);
            ServiceError::db_error("Error updating supplier")
        })?;

        Ok(())
    }

    async fn exists(&self, id: &EntityId) -> Result<bool, ServiceError> {
        let found = SupplierEntity::find_by_id(id.as_uuid())
            .one(&*self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn find_by_id(&self, id: &EntityId) -> Result<Option<Supplier>, ServiceError> {
        SupplierEntity::find_by_id(id.as_uuid())
            .one(&*self.db)
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Supplier>, ServiceError> {
        let rows = SupplierEntity::find()
            .order_by_desc(supplier::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        rows.into_iter().map(to_domain).collect()
    }

    async fn search(
        &self,
        params: &SupplierSearchParams,
    ) -> Result<SupplierSearchResult, ServiceError> {
        let mut condition = Condition::all();
        if let Some(filter) = params.filter() {
            if let Some(name) = filter.name.as_deref() {
                condition = condition.add(supplier::Column::Name.contains(name));
            }
            if let Some(is_active) = filter.is_active {
                condition = condition.add(supplier::Column::IsActive.eq(is_active));
            }
        }

        let query = SupplierEntity::find().filter(condition);
        let query = match params.sort() {
            Some(field) => {
                let column = sort_column(field).ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Sort field must be one of: {}",
                        self.sortable_fields().join(", ")
                    ))
                })?;
                let order = match params.sort_dir() {
                    Some(SortDirection::Desc) => Order::Desc,
                    _ => Order::Asc,
                };
                query.order_by(column, order)
            }
            None => query.order_by_desc(supplier::Column::CreatedAt),
        };

        let paginator = query.paginate(&*self.db, params.per_page());
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(params.page() - 1).await?;

        let items = rows
            .into_iter()
            .map(to_domain)
            .collect::<Result<Vec<_>, _>>()?;

        SearchResult::new(items, total, params.page(), params.per_page())
    }

    fn sortable_fields(&self) -> &'static [&'static str] {
        SORTABLE_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sortable_field_maps_to_a_column() {
        for field in SORTABLE_FIELDS {
            assert!(sort_column(field).is_some(), "{} should be sortable", field);
        }
    }

    #[test]
    fn unknown_fields_map_to_no_column() {
        assert!(sort_column("telephone").is_none());
        assert!(sort_column("").is_none());
    }
}
