use std::collections::BTreeMap;

use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorResponse { pub error: String }

/// One service line. `price` is a string or a number as stored in the sheet.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct PriceItemDoc {
    pub service: String,
    #[schema(value_type = Object)]
    pub price: serde_json::Value,
    pub prefix: Option<String>,
    pub additional_info: Option<String>,
}

/// Category name to items; keys keep the configured category order.
#[derive(ToSchema)]
pub struct PriceListDoc(pub BTreeMap<String, Vec<PriceItemDoc>>);

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::prices::get_prices,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            PriceItemDoc,
            PriceListDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "prices")
    )
)]
pub struct ApiDoc;
