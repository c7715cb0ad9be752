use anyhow::Context;
use axum::{extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, AppQuery, StdResponse},
    app_state::AppState,
    middleware,
    models::ProductEntity,
    schema::products,
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/products",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_products))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::require_auth,
            )),
    )
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct ProductRes {
    pub id: i32,
    pub name: String,
    pub cost: i32,
}

impl From<ProductEntity> for ProductRes {
    fn from(product: ProductEntity) -> Self {
        Self {
            id: product.id,
            name: product.name,
            cost: product.unit_cost,
        }
    }
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Restaurant whose menu is listed.
    pub restaurant: i32,
}

/// List the products of one restaurant.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Products"],
    security(("bearerAuth" = [])),
    params(ProductFilter),
    responses(
        (status = 200, description = "List products", body = StdResponse<Vec<ProductRes>, String>),
        (status = 400, description = "Missing or invalid restaurant", body = StdResponse<Vec<ProductRes>, String>),
        (status = 404, description = "Restaurant has no products", body = StdResponse<Vec<ProductRes>, String>)
    )
)]
async fn get_products(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ProductFilter>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let products: Vec<ProductEntity> = products::table
        .filter(products::restaurant_id.eq(filter.restaurant))
        .select(ProductEntity::as_select())
        .order_by(products::id.asc())
        .load(conn)
        .await
        .context("Failed to get products")?;

    if products.is_empty() {
        return Err(AppError::NotFound(format!(
            "No products found for restaurant ID {}",
            filter.restaurant
        )));
    }

    tracing::debug!(restaurant_id = filter.restaurant, count = products.len(), "products loaded");
    Ok(StdResponse {
        data: Some(products.into_iter().map(ProductRes::from).collect::<Vec<_>>()),
        message: Some("Success"),
    })
}
