use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
    dsl::{count, sum},
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, AppJson, AppPath, AppQuery, ErrorBody, StdResponse},
    app_state::AppState,
    auth::AuthUser,
    domain::{
        rating::ceil_average,
        validation::{is_blank, is_valid_email},
    },
    middleware,
    models::{
        AddressEntity, CreateAddressEntity, CreateRestaurantEntity, RestaurantEntity,
        UpdateRestaurantEntity,
    },
    schema::{addresses, orders, restaurants, users},
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/restaurants",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_restaurants))
            .routes(utoipa_axum::routes!(create_restaurant))
            .routes(utoipa_axum::routes!(get_restaurant))
            .routes(utoipa_axum::routes!(update_restaurant))
            .routes(utoipa_axum::routes!(delete_restaurant))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::require_auth,
            )),
    )
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct RestaurantRes {
    pub id: i32,
    pub name: String,
    pub price_range: i32,
    pub rating: i32,
    pub address: AddressEntity,
}

impl RestaurantRes {
    fn new(restaurant: RestaurantEntity, address: AddressEntity, rating: i32) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name,
            price_range: restaurant.price_range,
            rating,
            address,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct AddressReq {
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct RestaurantReq {
    pub user_id: Option<i32>,
    pub name: Option<String>,
    pub price_range: Option<i32>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<AddressReq>,
}

/// A create/update payload with every field checked.
#[derive(Debug, PartialEq, Eq)]
struct ValidRestaurant {
    user_id: i32,
    name: String,
    price_range: i32,
    phone: String,
    email: String,
    street_address: String,
    city: String,
    postal_code: String,
}

impl RestaurantReq {
    fn validate(self) -> Result<ValidRestaurant, AppError> {
        fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
            if is_blank(value.as_deref()) {
                return Err(AppError::BadRequest(message.into()));
            }
            Ok(value.unwrap_or_default().trim().to_owned())
        }

        let user_id = self
            .user_id
            .ok_or_else(|| AppError::BadRequest("User ID is required".into()))?;
        let name = required(self.name, "Name is required")?;
        // An absent price range counts as 0.
        let price_range = match self.price_range.unwrap_or(0) {
            p if p < 1 => {
                return Err(AppError::BadRequest("Price range must be at least 1".into()));
            }
            p if p > 3 => {
                return Err(AppError::BadRequest("Price range must be at most 3".into()));
            }
            p => p,
        };
        let phone = required(self.phone, "Phone is required")?;
        let email = required(self.email, "Email is required")?;
        if !is_valid_email(&email) {
            return Err(AppError::BadRequest("Email should be valid".into()));
        }
        let address = self
            .address
            .ok_or_else(|| AppError::BadRequest("Address is required".into()))?;

        Ok(ValidRestaurant {
            user_id,
            name,
            price_range,
            phone,
            email,
            street_address: required(address.street_address, "Street address is required")?,
            city: required(address.city, "City is required")?,
            postal_code: required(address.postal_code, "Postal code is required")?,
        })
    }
}

impl ValidRestaurant {
    fn address(&self) -> CreateAddressEntity {
        CreateAddressEntity {
            street_address: self.street_address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
        }
    }

    fn changes(&self) -> UpdateRestaurantEntity {
        UpdateRestaurantEntity {
            user_id: self.user_id,
            name: self.name.clone(),
            price_range: self.price_range,
            phone: self.phone.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct RestaurantFilter {
    /// Exact computed rating (0-5).
    pub rating: Option<i32>,
    /// Exact price range (1-3).
    pub price_range: Option<i32>,
}

/// Rating of one restaurant, rounded up; `0` without orders.
async fn restaurant_rating(conn: &mut AsyncPgConnection, restaurant_id: i32) -> Result<i32> {
    let (total, rated): (Option<i64>, i64) = orders::table
        .filter(orders::restaurant_id.eq(restaurant_id))
        .select((sum(orders::restaurant_rating), count(orders::id)))
        .get_result(conn)
        .await
        .context("Failed to aggregate restaurant rating")?;

    Ok(ceil_average(total.unwrap_or(0), rated))
}

/// Ratings of every restaurant that has at least one order.
async fn all_ratings(conn: &mut AsyncPgConnection) -> Result<HashMap<i32, i32>> {
    let rows: Vec<(i32, Option<i64>, i64)> = orders::table
        .group_by(orders::restaurant_id)
        .select((
            orders::restaurant_id,
            sum(orders::restaurant_rating),
            count(orders::id),
        ))
        .load(conn)
        .await
        .context("Failed to aggregate restaurant ratings")?;

    Ok(rows
        .into_iter()
        .map(|(restaurant_id, total, rated)| {
            (restaurant_id, ceil_average(total.unwrap_or(0), rated))
        })
        .collect())
}

async fn find_restaurant(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<Option<(RestaurantEntity, AddressEntity)>> {
    restaurants::table
        .inner_join(addresses::table)
        .filter(restaurants::id.eq(id))
        .select((RestaurantEntity::as_select(), AddressEntity::as_select()))
        .first(conn)
        .await
        .optional()
        .context("Failed to get restaurant")
}

/// Checks the owner exists and holds a key-share lock on it until the
/// surrounding transaction ends.
async fn ensure_user_exists(conn: &mut AsyncPgConnection, user_id: i32) -> Result<(), AppError> {
    let user: Option<i32> = users::table
        .find(user_id)
        .select(users::id)
        .for_key_share()
        .first(conn)
        .await
        .optional()
        .context("Failed to look up user")?;

    match user {
        Some(_) => Ok(()),
        None => Err(AppError::Validation("User not found".into())),
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Restaurant with id {id} not found"))
}

/// List restaurants, optionally filtered by rating and price range.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    params(RestaurantFilter),
    responses(
        (status = 200, description = "List restaurants", body = StdResponse<Vec<RestaurantRes>, String>)
    )
)]
async fn get_restaurants(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<RestaurantFilter>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(rating = ?filter.rating, price_range = ?filter.price_range, "fetching restaurants");

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut query = restaurants::table
        .inner_join(addresses::table)
        .select((RestaurantEntity::as_select(), AddressEntity::as_select()))
        .order_by(restaurants::id.asc())
        .into_boxed();
    if let Some(price_range) = filter.price_range {
        query = query.filter(restaurants::price_range.eq(price_range));
    }

    let rows: Vec<(RestaurantEntity, AddressEntity)> = query
        .load(conn)
        .await
        .context("Failed to get restaurants")?;
    let ratings = all_ratings(conn).await?;

    let restaurants: Vec<RestaurantRes> = rows
        .into_iter()
        .map(|(restaurant, address)| {
            let rating = ratings.get(&restaurant.id).copied().unwrap_or(0);
            RestaurantRes::new(restaurant, address, rating)
        })
        .filter(|res| filter.rating.is_none_or(|rating| res.rating == rating))
        .collect();

    Ok(StdResponse {
        data: Some(restaurants),
        message: Some("Success"),
    })
}

/// Create a restaurant together with its address.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    request_body = RestaurantReq,
    responses(
        (status = 201, description = "Created restaurant successfully", body = StdResponse<RestaurantRes, String>),
        (status = 400, description = "Invalid payload or unknown user", body = ErrorBody)
    )
)]
async fn create_restaurant(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    AppJson(body): AppJson<RestaurantReq>,
) -> Result<impl IntoResponse, AppError> {
    let valid = body.validate()?;
    tracing::info!(caller = caller.id, name = %valid.name, "creating restaurant");

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let created = conn
        .transaction(move |conn| {
            Box::pin(async move {
                ensure_user_exists(conn, valid.user_id).await?;

                let address: AddressEntity = diesel::insert_into(addresses::table)
                    .values(valid.address())
                    .returning(AddressEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create address")?;

                let restaurant: RestaurantEntity = diesel::insert_into(restaurants::table)
                    .values(CreateRestaurantEntity {
                        user_id: valid.user_id,
                        address_id: address.id,
                        name: valid.name,
                        price_range: valid.price_range,
                        phone: valid.phone,
                        email: valid.email,
                    })
                    .returning(RestaurantEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create restaurant")?;

                Ok::<RestaurantRes, AppError>(RestaurantRes::new(restaurant, address, 0))
            })
        })
        .await?;

    tracing::info!(restaurant_id = created.id, "restaurant created");
    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(created),
            message: Some("Success"),
        },
    ))
}

/// Fetch a single restaurant with its rating.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Restaurant ID to fetch")
    ),
    responses(
        (status = 200, description = "Get restaurant successfully", body = StdResponse<RestaurantRes, String>),
        (status = 404, description = "Restaurant not found", body = StdResponse<RestaurantRes, String>)
    )
)]
async fn get_restaurant(
    AppPath(id): AppPath<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (restaurant, address) = find_restaurant(conn, id).await?.ok_or_else(|| not_found(id))?;
    let rating = restaurant_rating(conn, id).await?;

    Ok(StdResponse {
        data: Some(RestaurantRes::new(restaurant, address, rating)),
        message: Some("Success"),
    })
}

/// Replace a restaurant's details and address.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Restaurant ID to update")
    ),
    request_body = RestaurantReq,
    responses(
        (status = 200, description = "Updated restaurant successfully", body = StdResponse<RestaurantRes, String>),
        (status = 400, description = "Invalid payload or unknown user", body = ErrorBody),
        (status = 404, description = "Restaurant not found", body = StdResponse<RestaurantRes, String>)
    )
)]
async fn update_restaurant(
    AppPath(id): AppPath<i32>,
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    AppJson(body): AppJson<RestaurantReq>,
) -> Result<impl IntoResponse, AppError> {
    let valid = body.validate()?;
    tracing::info!(caller = caller.id, restaurant_id = id, "updating restaurant");

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = conn
        .transaction(move |conn| {
            Box::pin(async move {
                ensure_user_exists(conn, valid.user_id).await?;
                let (existing, _) = find_restaurant(conn, id).await?.ok_or_else(|| not_found(id))?;

                let restaurant: RestaurantEntity = diesel::update(restaurants::table.find(id))
                    .set(valid.changes())
                    .returning(RestaurantEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to update restaurant")?;

                let address: AddressEntity =
                    diesel::update(addresses::table.find(existing.address_id))
                        .set(valid.address())
                        .returning(AddressEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to update address")?;

                let rating = restaurant_rating(conn, id).await?;
                Ok::<RestaurantRes, AppError>(RestaurantRes::new(restaurant, address, rating))
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(updated),
        message: Some("Success"),
    })
}

/// Delete a restaurant, its products and orders, then its address.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Restaurant ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted restaurant successfully", body = StdResponse<RestaurantRes, String>),
        (status = 404, description = "Restaurant not found", body = StdResponse<RestaurantRes, String>)
    )
)]
async fn delete_restaurant(
    AppPath(id): AppPath<i32>,
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(caller = caller.id, restaurant_id = id, "deleting restaurant");

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let (restaurant, address) =
                    find_restaurant(conn, id).await?.ok_or_else(|| not_found(id))?;
                let rating = restaurant_rating(conn, id).await?;

                // Products, orders and their line items go with the restaurant.
                diesel::delete(restaurants::table.find(id))
                    .execute(conn)
                    .await
                    .context("Failed to delete restaurant")?;
                diesel::delete(addresses::table.find(address.id))
                    .execute(conn)
                    .await
                    .context("Failed to delete restaurant address")?;

                Ok::<RestaurantRes, AppError>(RestaurantRes::new(restaurant, address, rating))
            })
        })
        .await?;

    tracing::info!(restaurant_id = id, "restaurant deleted");
    Ok(StdResponse {
        data: Some(deleted),
        message: Some("Success"),
    })
}
