use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, AppJson, AppPath, AppQuery, StdResponse},
    app_state::AppState,
    auth::AuthUser,
    domain::{
        order::{
            INITIAL_RESTAURANT_RATING, INITIAL_STATUS, LineRequest, OrderLineView, OrderOwner,
            OrderView, check_lines,
        },
        validation::is_blank,
    },
    middleware,
    models::{
        CreateOrderEntity, CreateProductOrderEntity, OrderEntity, OrderStatusEntity,
        ProductEntity, ProductOrderEntity,
    },
    schema::{customers, order_statuses, orders, product_orders, products, restaurants},
};

const INVALID_PARAMETERS: &str = "Invalid or missing parameters";

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/order",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_orders))
            .routes(utoipa_axum::routes!(create_order))
            .routes(utoipa_axum::routes!(update_order_status))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::require_auth,
            )),
    )
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    /// `customer`, `restaurant` or `courier`, any case.
    #[serde(rename = "type")]
    pub owner: String,
    pub id: i32,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct CreateOrderReq {
    pub customer_id: i32,
    pub restaurant_id: i32,
    pub products: Vec<LineRequest>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct UpdateStatusReq {
    pub status: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq, Eq)]
pub struct UpdateStatusRes {
    pub status: String,
}

/// Builds order views, attaching status names and product lines.
async fn load_views(
    conn: &mut AsyncPgConnection,
    orders: Vec<OrderEntity>,
) -> Result<Vec<OrderView>> {
    let order_ids: Vec<i32> = orders.iter().map(|order| order.id).collect();

    let statuses: HashMap<i32, String> = order_statuses::table
        .select(OrderStatusEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get order statuses")?
        .into_iter()
        .map(|status| (status.id, status.name))
        .collect();

    let lines: Vec<(ProductOrderEntity, String)> = product_orders::table
        .inner_join(products::table)
        .filter(product_orders::order_id.eq_any(&order_ids))
        .select((ProductOrderEntity::as_select(), products::name))
        .order_by(product_orders::id.asc())
        .load(conn)
        .await
        .context("Failed to get order lines")?;

    let mut group: HashMap<i32, Vec<OrderLineView>> = HashMap::new();
    for (line, product_name) in lines {
        group.entry(line.order_id).or_default().push(OrderLineView::new(
            line.product_id,
            product_name,
            line.product_quantity,
            line.product_unit_cost,
        ));
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let status = statuses.get(&order.status_id).cloned().unwrap_or_default();
            let lines = group.remove(&order.id).unwrap_or_default();
            OrderView::new(
                order.id,
                order.customer_id,
                order.restaurant_id,
                order.courier_id,
                status,
                lines,
            )
        })
        .collect())
}

/// List the orders of a customer, restaurant or courier.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(OrderFilter),
    responses(
        (status = 200, description = "List orders", body = StdResponse<Vec<OrderView>, String>),
        (status = 400, description = "Invalid or missing parameters", body = StdResponse<Vec<OrderView>, String>)
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let owner: OrderOwner = filter
        .owner
        .parse()
        .map_err(|_| AppError::BadRequest(INVALID_PARAMETERS.into()))?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let query = orders::table
        .select(OrderEntity::as_select())
        .order_by(orders::id.asc())
        .into_boxed();
    let query = match owner {
        OrderOwner::Customer => query.filter(orders::customer_id.eq(filter.id)),
        OrderOwner::Restaurant => query.filter(orders::restaurant_id.eq(filter.id)),
        OrderOwner::Courier => query.filter(orders::courier_id.eq(filter.id)),
    };

    let orders: Vec<OrderEntity> = query.load(conn).await.context("Failed to get orders")?;
    let views = load_views(conn, orders).await?;

    Ok(StdResponse {
        data: Some(views),
        message: Some("Success"),
    })
}

/// Place an order for products of a single restaurant.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Created order successfully", body = StdResponse<OrderView, String>),
        (status = 400, description = "Invalid product lines", body = StdResponse<OrderView, String>),
        (status = 404, description = "Restaurant, customer, product or status not found", body = StdResponse<OrderView, String>)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    AppJson(body): AppJson<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    check_lines(&body.products).map_err(|err| AppError::BadRequest(err.to_string()))?;
    tracing::info!(
        caller = caller.id,
        customer_id = body.customer_id,
        restaurant_id = body.restaurant_id,
        lines = body.products.len(),
        "creating order"
    );

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let restaurant: Option<i32> = restaurants::table
                    .find(body.restaurant_id)
                    .select(restaurants::id)
                    .first(conn)
                    .await
                    .optional()
                    .context("Failed to get restaurant")?;
                if restaurant.is_none() {
                    return Err(AppError::NotFound(format!(
                        "Restaurant with id {} not found",
                        body.restaurant_id
                    )));
                }

                let customer: Option<i32> = customers::table
                    .find(body.customer_id)
                    .select(customers::id)
                    .first(conn)
                    .await
                    .optional()
                    .context("Failed to get customer")?;
                if customer.is_none() {
                    return Err(AppError::NotFound(format!(
                        "Customer with id {} not found",
                        body.customer_id
                    )));
                }

                let product_ids: Vec<i32> = body.products.iter().map(|line| line.id).collect();
                let menu: HashMap<i32, ProductEntity> = products::table
                    .filter(products::id.eq_any(&product_ids))
                    .filter(products::restaurant_id.eq(body.restaurant_id))
                    .select(ProductEntity::as_select())
                    .load(conn)
                    .await
                    .context("Failed to get products")?
                    .into_iter()
                    .map(|product| (product.id, product))
                    .collect();
                if let Some(missing) = product_ids.iter().find(|id| !menu.contains_key(*id)) {
                    return Err(AppError::NotFound(format!(
                        "Product with id {missing} not found or does not belong to the restaurant"
                    )));
                }

                let status: OrderStatusEntity = order_statuses::table
                    .filter(order_statuses::name.eq(INITIAL_STATUS))
                    .select(OrderStatusEntity::as_select())
                    .first(conn)
                    .await
                    .optional()
                    .context("Failed to get order status")?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Order status '{INITIAL_STATUS}' not found"))
                    })?;

                let order: OrderEntity = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        restaurant_id: body.restaurant_id,
                        customer_id: body.customer_id,
                        status_id: status.id,
                        restaurant_rating: INITIAL_RESTAURANT_RATING,
                    })
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create order")?;

                let new_lines: Vec<CreateProductOrderEntity> = body
                    .products
                    .iter()
                    .filter_map(|line| {
                        menu.get(&line.id).map(|product| CreateProductOrderEntity {
                            product_id: product.id,
                            order_id: order.id,
                            product_quantity: line.quantity,
                            product_unit_cost: product.unit_cost,
                        })
                    })
                    .collect();
                diesel::insert_into(product_orders::table)
                    .values(&new_lines)
                    .execute(conn)
                    .await
                    .context("Failed to create order lines")?;

                let lines = new_lines
                    .into_iter()
                    .filter_map(|line| {
                        menu.get(&line.product_id).map(|product| {
                            OrderLineView::new(
                                line.product_id,
                                product.name.clone(),
                                line.product_quantity,
                                line.product_unit_cost,
                            )
                        })
                    })
                    .collect();

                Ok::<OrderView, AppError>(OrderView::new(
                    order.id,
                    order.customer_id,
                    order.restaurant_id,
                    order.courier_id,
                    status.name,
                    lines,
                ))
            })
        })
        .await?;

    tracing::info!(order_id = order.id, total_cost = order.total_cost, "order created");
    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(order),
            message: Some("Success"),
        },
    ))
}

/// Move an order to another status.
#[utoipa::path(
    post,
    path = "/{id}/status",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to update")
    ),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Updated order status successfully", body = StdResponse<UpdateStatusRes, String>),
        (status = 400, description = "Invalid or missing parameters", body = StdResponse<UpdateStatusRes, String>),
        (status = 404, description = "Order or status not found", body = StdResponse<UpdateStatusRes, String>)
    )
)]
async fn update_order_status(
    AppPath(id): AppPath<i32>,
    State(state): State<AppState>,
    AppJson(body): AppJson<UpdateStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    if is_blank(body.status.as_deref()) {
        return Err(AppError::BadRequest(INVALID_PARAMETERS.into()));
    }
    let name = body.status.unwrap_or_default().trim().to_owned();

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let status = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let order: Option<i32> = orders::table
                    .find(id)
                    .select(orders::id)
                    .first(conn)
                    .await
                    .optional()
                    .context("Failed to get order")?;
                if order.is_none() {
                    return Err(AppError::NotFound(format!("Order with id {id} not found")));
                }

                let status: OrderStatusEntity = order_statuses::table
                    .filter(order_statuses::name.eq(&name))
                    .select(OrderStatusEntity::as_select())
                    .first(conn)
                    .await
                    .optional()
                    .context("Failed to get order status")?
                    .ok_or_else(|| AppError::NotFound(format!("Order status {name} not found")))?;

                diesel::update(orders::table.find(id))
                    .set((
                        orders::status_id.eq(status.id),
                        orders::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await
                    .context("Failed to update order status")?;

                Ok::<String, AppError>(status.name)
            })
        })
        .await?;

    tracing::info!(order_id = id, %status, "order status updated");
    Ok(StdResponse {
        data: Some(UpdateStatusRes { status }),
        message: Some("Success"),
    })
}
