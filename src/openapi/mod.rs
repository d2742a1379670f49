use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "IMEI Stock API",
        version = "0.1.0",
        description = r#"
# IMEI Stock API

Warehouse inventory for refurbished mobile devices tracked by IMEI.

## Features

- **Goods-in**: receive batches of devices under a new purchase order
- **Quality control**: record cosmetic and functional results per device
- **Goods-out**: fulfil sales orders by allocating in-stock devices
- **Reference data**: customers, suppliers, manufacturer categories, trays and TAC lookup

## Operator

Writes are attributed in the audit log to the operator named in the `x-user`
header (`system` when absent).

## Error Handling

Failures return a JSON body with an `error` message:

```json
{
  "error": "Not found: purchase order 42",
  "request_id": "b7d3...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100)
and return `pagination: {page, limit, totalCount, totalPages}`.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "reference-data", description = "Customers, suppliers, categories, trays and TAC codes"),
        (name = "goods-in", description = "Receiving"),
        (name = "qc", description = "Quality control"),
        (name = "goods-out", description = "Sales orders"),
        (name = "users", description = "Account management"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        // Reference data
        crate::handlers::catalog::list_categories,
        crate::handlers::catalog::list_trays,
        crate::handlers::catalog::lookup_tac,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::create_customer,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::create_supplier,

        // Goods-in
        crate::handlers::goods_in::list_goods_in,
        crate::handlers::goods_in::submit_goods_in,

        // QC
        crate::handlers::qc::list_qc_purchases,
        crate::handlers::qc::purchase_devices,
        crate::handlers::qc::update_purchase_qc,
        crate::handlers::qc::list_qc_records,
        crate::handlers::qc::record_qc,

        // Goods-out
        crate::handlers::sales_orders::list_goods_out,
        crate::handlers::sales_orders::get_sales_order,
        crate::handlers::sales_orders::create_sales_order,
        crate::handlers::sales_orders::update_sales_order_item,

        // Users
        crate::handlers::users::change_password,

        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::status,
    ),
    components(
        schemas(
            crate::pagination::PaginationMeta,
            crate::models::Grade,
            crate::entities::device::StockStatus,
            crate::services::purchases::QcStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
