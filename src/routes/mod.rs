pub mod auth;
pub mod orders;
pub mod products;
pub mod restaurants;

use utoipa_axum::router::OpenApiRouter;

use crate::app_state::AppState;

/// Every public route of the service. All but `/api/auth` sit behind the
/// bearer-token layer.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    auth::routes_with_openapi()
        .merge(restaurants::routes_with_openapi(state))
        .merge(products::routes_with_openapi(state))
        .merge(orders::routes_with_openapi(state))
}
