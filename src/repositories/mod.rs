use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::errors::ServiceError;
use crate::models::supplier::{Supplier, SupplierFilter};
use crate::models::EntityId;
use crate::search::{SearchParams, SearchResult};

pub mod supplier_repository;

pub use supplier_repository::SeaOrmSupplierRepository;

pub type SupplierSearchParams = SearchParams<SupplierFilter>;
pub type SupplierSearchResult = SearchResult<Supplier>;

/// Persistence port for the supplier aggregate.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SupplierRepository: Send + Sync {
    async fn insert(&self, supplier: &Supplier) -> Result<(), ServiceError>;

    /// Full-field replacement of an existing supplier.
    async fn update(&self, id: &EntityId, supplier: &Supplier) -> Result<(), ServiceError>;

    async fn exists(&self, id: &EntityId) -> Result<bool, ServiceError>;

    async fn find_by_id(&self, id: &EntityId) -> Result<Option<Supplier>, ServiceError>;

    async fn find_all(&self) -> Result<Vec<Supplier>, ServiceError>;

    async fn search(
        &self,
        params: &SupplierSearchParams,
    ) -> Result<SupplierSearchResult, ServiceError>;

    /// Field names `search` accepts in its sort parameter.
    fn sortable_fields(&self) -> &'static [&'static str];
}
