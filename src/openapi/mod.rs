use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SupplierHub API",
        version = "0.1.0",
        description = r#"
# SupplierHub Supplier Management API

Supplier records behind a CQRS core. Writes go through commands, reads go
through queries, and every accepted write publishes a domain event.

## Errors

Failures share one envelope. `error` names the HTTP status, `message` says
what went wrong, and `request_id` ties the response back to the server logs:

```json
{
  "error": "Bad Request",
  "message": "Supplier name must be at least 3 characters",
  "request_id": "2d9f...",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Searching

`GET /api/v1/suppliers/search` takes `page` and `per_page` for paging,
`name` and `is_active` to narrow the result set, plus `sort` (one of
`name`, `created_at`, `updated_at`) with `sort_dir` (`asc` or `desc`).
        "#,
        contact(
            name = "SupplierHub Support",
            email = "support@supplierhub.io",
            url = "https://supplierhub.io"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "https://api.supplierhub.io", description = "Production server"),
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Suppliers", description = "Supplier management endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::search_suppliers,
    ),
    components(
        schemas(
            // Envelopes
            crate::ApiResponse<serde_json::Value>,
            crate::ResponseMeta,
            crate::errors::ErrorResponse,

            // Supplier payloads
            crate::handlers::suppliers::CreateSupplierRequest,
            crate::handlers::suppliers::UpdateSupplierRequest,
            crate::commands::suppliers::CreateSupplierResult,
            crate::commands::suppliers::UpdateSupplierResult,
            crate::queries::supplier_queries::SupplierDto,
            crate::queries::supplier_queries::SearchSuppliersResult,
            crate::search::SortDirection
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
