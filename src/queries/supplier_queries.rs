use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::models::supplier::{Supplier, SupplierFilter};
use crate::models::EntityId;
use crate::queries::QueryHandler;
use crate::repositories::SupplierRepository;
use crate::search::{SearchParams, SearchParamsInput, SortDirection};

/// Registry identifiers the supplier query handlers are dispatched under.
pub const DETAIL_SUPPLIER: &str = "suppliers.detail";
pub const LIST_SUPPLIERS: &str = "suppliers.list";
pub const SEARCH_SUPPLIERS: &str = "suppliers.search";

/// Read-side projection of a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SupplierDto {
    pub id: String,
    pub name: String,
    pub telephone: String,
    pub social_media: String,
    pub is_active: bool,
}

impl From<Supplier> for SupplierDto {
    fn from(supplier: Supplier) -> Self {
        Self {
            id: supplier.id().to_string(),
            name: supplier.name().to_string(),
            telephone: supplier.telephone().to_string(),
            social_media: supplier.social_media().to_string(),
            is_active: supplier.is_active(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailSupplierQuery {
    pub supplier_id: String,
}

pub struct DetailSupplierHandler {
    repository: Arc<dyn SupplierRepository>,
}

impl DetailSupplierHandler {
    pub fn new(repository: Arc<dyn SupplierRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<DetailSupplierQuery> for DetailSupplierHandler {
    type Result = SupplierDto;

    #[instrument(skip(self, query))]
    async fn execute(&self, query: DetailSupplierQuery) -> Result<Self::Result, ServiceError> {
        let id = EntityId::parse(&query.supplier_id)?;
        let supplier = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Supplier not found".to_string()))?;

        Ok(SupplierDto::from(supplier))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSuppliersQuery;

pub struct ListSuppliersHandler {
    repository: Arc<dyn SupplierRepository>,
}

impl ListSuppliersHandler {
    pub fn new(repository: Arc<dyn SupplierRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<ListSuppliersQuery> for ListSuppliersHandler {
    type Result = Vec<SupplierDto>;

    #[instrument(skip(self, _query))]
    async fn execute(&self, _query: ListSuppliersQuery) -> Result<Self::Result, ServiceError> {
        let suppliers = self.repository.find_all().await?;
        Ok(suppliers.into_iter().map(SupplierDto::from).collect())
    }
}

/// Raw pagination, sorting and filtering input, normalized by the handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchSuppliersQuery {
    pub page: Option<f64>,
    pub per_page: Option<f64>,
    pub sort: Option<String>,
    pub sort_dir: Option<SortDirection>,
    pub filter: Option<SupplierFilter>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchSuppliersResult {
    pub items: Vec<SupplierDto>,
    pub total: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub last_page: u64,
}

pub struct SearchSuppliersHandler {
    repository: Arc<dyn SupplierRepository>,
}

impl SearchSuppliersHandler {
    pub fn new(repository: Arc<dyn SupplierRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<SearchSuppliersQuery> for SearchSuppliersHandler {
    type Result = SearchSuppliersResult;

    #[instrument(skip(self, query))]
    async fn execute(&self, query: SearchSuppliersQuery) -> Result<Self::Result, ServiceError> {
        let params = SearchParams::new(SearchParamsInput {
            page: query.page,
            per_page: query.per_page,
            sort: query.sort,
            sort_dir: query.sort_dir,
            filter: query.filter,
        })?;

        let found = self.repository.search(&params).await?;
        Ok(SearchSuppliersResult {
            total: found.total(),
            current_page: found.current_page(),
            per_page: found.per_page(),
            last_page: found.last_page(),
            items: found.map(SupplierDto::from).into_items(),
        })
    }
}
