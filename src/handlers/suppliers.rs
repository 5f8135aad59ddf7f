use crate::{
    commands::suppliers::{
        CreateSupplierCommand, CreateSupplierResult, UpdateSupplierCommand, UpdateSupplierResult,
    },
    errors::ServiceError,
    handlers::AppState,
    models::supplier::SupplierFilter,
    queries::supplier_queries::{SearchSuppliersQuery, SearchSuppliersResult, SupplierDto},
    search::SortDirection,
    ApiResponse, ApiResult,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

// Request DTOs. Field constraints live on the supplier aggregate so the
// domain messages surface unchanged.

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSupplierRequest {
    pub name: String,
    pub telephone: String,
    pub social_media: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSupplierRequest {
    pub name: String,
    pub telephone: String,
    pub social_media: String,
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchSuppliersParams {
    /// Page number (default: 1)
    pub page: Option<f64>,
    /// Items per page (default: 15)
    pub per_page: Option<f64>,
    /// Sort field: name, created_at or updated_at
    pub sort: Option<String>,
    /// Sort direction: asc or desc
    pub sort_dir: Option<SortDirection>,
    /// Substring match on the supplier name
    pub name: Option<String>,
    /// Exact match on the active flag
    pub is_active: Option<bool>,
}

/// Create a new supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created successfully", body = ApiResponse<CreateSupplierResult>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateSupplierResult>>), ServiceError> {
    let command = CreateSupplierCommand {
        name: request.name,
        telephone: request.telephone,
        social_media: request.social_media,
    };

    let created = state.services.suppliers.create_supplier(command).await?;

    info!("Supplier created: {}", created.supplier_id);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Get a supplier by ID
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(
        ("id" = String, Path, description = "Supplier identifier (UUID)")
    ),
    responses(
        (status = 200, description = "Supplier retrieved successfully", body = ApiResponse<SupplierDto>),
        (status = 400, description = "Malformed identifier", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SupplierDto> {
    let supplier = state.services.suppliers.detail_supplier(&id).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

/// Update a supplier
#[utoipa::path(
    put,
    path = "/api/v1/suppliers/{id}",
    params(
        ("id" = String, Path, description = "Supplier identifier (UUID)")
    ),
    request_body = UpdateSupplierRequest,
    responses(
        (status = 200, description = "Supplier updated successfully", body = ApiResponse<UpdateSupplierResult>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSupplierRequest>,
) -> ApiResult<UpdateSupplierResult> {
    let command = UpdateSupplierCommand {
        id,
        name: request.name,
        telephone: request.telephone,
        social_media: request.social_media,
        is_active: request.is_active,
    };

    let updated = state.services.suppliers.update_supplier(command).await?;

    info!("Supplier updated: {}", updated.id);
    Ok(Json(ApiResponse::success(updated)))
}

/// List all suppliers
#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    responses(
        (status = 200, description = "Suppliers retrieved successfully", body = ApiResponse<Vec<SupplierDto>>)
    ),
    tag = "Suppliers"
)]
pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Vec<SupplierDto>> {
    let suppliers = state.services.suppliers.list_suppliers().await?;
    Ok(Json(ApiResponse::success(suppliers)))
}

/// Search suppliers with pagination, sorting and filtering
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/search",
    params(SearchSuppliersParams),
    responses(
        (status = 200, description = "Suppliers searched successfully", body = ApiResponse<SearchSuppliersResult>),
        (status = 400, description = "Invalid search input", body = crate::errors::ErrorResponse)
    ),
    tag = "Suppliers"
)]
pub async fn search_suppliers(
    State(state): State<AppState>,
    Query(params): Query<SearchSuppliersParams>,
) -> ApiResult<SearchSuppliersResult> {
    let filter = if params.name.is_some() || params.is_active.is_some() {
        Some(SupplierFilter {
            name: params.name,
            is_active: params.is_active,
        })
    } else {
        None
    };

    let query = SearchSuppliersQuery {
        page: params.page,
        per_page: params.per_page,
        sort: params.sort,
        sort_dir: params.sort_dir,
        filter,
    };

    let result = state.services.suppliers.search_suppliers(query).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Creates the router for supplier endpoints
pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", post(create_supplier))
        .route("/suppliers", get(list_suppliers))
        .route("/suppliers/search", get(search_suppliers))
        .route("/suppliers/:id", get(get_supplier))
        .route("/suppliers/:id", put(update_supplier))
}
