//! End-to-end flows against a real PostgreSQL database.
//!
//! Runs only when `TEST_DATABASE_URL` is set; the schema is migrated on demand.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use serde_json::{Value, json};
use tokio::sync::OnceCell;

use common::{app, database_state, request, send};
use rocketfood_service::{
    app_state::AppState,
    auth::hash_password,
    db,
    models::{
        AddressEntity, CreateAddressEntity, CreateCustomerEntity, CreateProductEntity,
        CreateUserEntity, CustomerEntity, ProductEntity, UserEntity,
    },
    schema::{addresses, customers, products, users},
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static MIGRATED: OnceCell<()> = OnceCell::const_new();

fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

async fn migrate(url: &str) -> anyhow::Result<()> {
    MIGRATED
        .get_or_try_init(|| async {
            db::run_migrations_blocking(MIGRATIONS, url).await.map(|_| ())
        })
        .await?;
    Ok(())
}

/// Inserts a user with password `password` and a customer profile for it.
async fn seed_customer(
    state: &AppState,
    email: &str,
) -> anyhow::Result<(UserEntity, CustomerEntity)> {
    let conn = &mut state.db_pool.get().await?;

    let user: UserEntity = diesel::insert_into(users::table)
        .values(CreateUserEntity {
            name: "Owner".into(),
            email: email.to_owned(),
            password_hash: hash_password("password")?,
        })
        .returning(UserEntity::as_returning())
        .get_result(conn)
        .await?;

    let address: AddressEntity = diesel::insert_into(addresses::table)
        .values(CreateAddressEntity {
            street_address: "1 Customer Rd.".into(),
            city: "Montreal".into(),
            postal_code: "H1H1H1".into(),
        })
        .returning(AddressEntity::as_returning())
        .get_result(conn)
        .await?;

    let customer: CustomerEntity = diesel::insert_into(customers::table)
        .values(CreateCustomerEntity {
            user_id: user.id,
            address_id: address.id,
            phone: "5551234567".into(),
            email: email.to_owned(),
            name: "Customer".into(),
        })
        .returning(CustomerEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok((user, customer))
}

fn restaurant_json(user_id: i32, name: &str, price_range: i32) -> Value {
    json!({
        "user_id": user_id,
        "name": name,
        "price_range": price_range,
        "phone": "5555555555",
        "email": "owner@rocketfood.test",
        "address": {
            "street_address": "123 Wellington St.",
            "city": "Montreal",
            "postal_code": "H3G5Y6"
        }
    })
}

fn ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .map(|items| items.iter().filter_map(|item| item["id"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn order_lifecycle_updates_rating_and_status() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    migrate(&url).await?;

    let state = database_state(&url).await?;
    let app = app(state.clone());
    let suffix = Utc::now().timestamp_micros();
    let email = format!("owner{suffix}@rocketfood.test");

    let (user, customer) = seed_customer(&state, &email).await?;

    // Log in.
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/auth",
            None,
            Some(json!({ "email": email, "password": "password" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let token = format!("Bearer {}", body["access_token"].as_str().unwrap());

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/auth",
            None,
            Some(json!({ "email": email, "password": "wrong" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Restaurant with an unknown owner.
    let (status, body) = send(
        &app,
        request("POST", "/api/restaurants", Some(&token), Some(restaurant_json(-1, "Villa Wellington", 2))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "User not found");

    let (status, body) = send(
        &app,
        request("POST", "/api/restaurants", Some(&token), Some(restaurant_json(user.id, "Villa Wellington", 2))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["rating"], 0);
    let restaurant_id = body["data"]["id"].as_i64().unwrap() as i32;

    let menu: Vec<ProductEntity> = {
        let conn = &mut state.db_pool.get().await?;
        diesel::insert_into(products::table)
            .values(vec![
                CreateProductEntity {
                    restaurant_id,
                    name: "Pasta with Tomato and Basil".into(),
                    description: "House pasta".into(),
                    unit_cost: 100,
                },
                CreateProductEntity {
                    restaurant_id,
                    name: "Tuna Sashimi".into(),
                    description: "Fresh tuna".into(),
                    unit_cost: 150,
                },
            ])
            .returning(ProductEntity::as_returning())
            .get_results(conn)
            .await?
    };

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/products?restaurant={restaurant_id}"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Place an order.
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/order",
            Some(&token),
            Some(json!({
                "customer_id": customer.id,
                "restaurant_id": restaurant_id,
                "products": [
                    { "id": menu[0].id, "quantity": 2 },
                    { "id": menu[1].id, "quantity": 1 }
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "in progress");
    assert_eq!(body["data"]["total_cost"], 350);
    let order_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/order",
            Some(&token),
            Some(json!({
                "customer_id": customer.id,
                "restaurant_id": restaurant_id,
                "products": [{ "id": -5, "quantity": 1 }]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "Product with id -5 not found or does not belong to the restaurant"
    );

    let (status, body) = send(
        &app,
        request("GET", &format!("/api/restaurants/{restaurant_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"], 1);

    // Deliver it.
    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/api/order/{order_id}/status"),
            Some(&token),
            Some(json!({ "status": "delivered" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "delivered");

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/api/order/{order_id}/status"),
            Some(&token),
            Some(json!({ "status": "lost" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order status lost not found");

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/order?type=Customer&id={}", customer.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "delivered");
    assert_eq!(orders[0]["products"].as_array().unwrap().len(), 2);

    // Delete the restaurant and everything hanging off it.
    let (status, body) = send(
        &app,
        request("DELETE", &format!("/api/restaurants/{restaurant_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], restaurant_id);

    let (status, body) = send(
        &app,
        request("GET", &format!("/api/restaurants/{restaurant_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        format!("Restaurant with id {restaurant_id} not found")
    );

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/order?type=customer&id={}", customer.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_restaurant_is_not_found() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    migrate(&url).await?;

    let app = app(database_state(&url).await?);
    let token = common::bearer(1);

    let (status, body) = send(
        &app,
        request("GET", "/api/restaurants/-1", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Restaurant with id -1 not found");

    let (status, body) = send(
        &app,
        request("GET", "/api/products?restaurant=-1", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No products found for restaurant ID -1");

    Ok(())
}

#[tokio::test]
async fn order_lines_keep_their_price_and_restaurant() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    migrate(&url).await?;

    let state = database_state(&url).await?;
    let app = app(state.clone());
    let email = format!("edges{}@rocketfood.test", Utc::now().timestamp_micros());
    let (user, customer) = seed_customer(&state, &email).await?;
    let token = common::bearer(user.id);

    let mut restaurant_ids = Vec::new();
    for name in ["Rated Kitchen", "Quiet Kitchen"] {
        let (status, body) = send(
            &app,
            request("POST", "/api/restaurants", Some(&token), Some(restaurant_json(user.id, name, 2))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        restaurant_ids.push(body["data"]["id"].as_i64().unwrap() as i32);
    }
    let (rated, quiet) = (restaurant_ids[0], restaurant_ids[1]);

    let (pasta, soup) = {
        let conn = &mut state.db_pool.get().await?;
        let pasta: ProductEntity = diesel::insert_into(products::table)
            .values(CreateProductEntity {
                restaurant_id: rated,
                name: "Pasta".into(),
                description: "House pasta".into(),
                unit_cost: 100,
            })
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await?;
        let soup: ProductEntity = diesel::insert_into(products::table)
            .values(CreateProductEntity {
                restaurant_id: quiet,
                name: "Soup".into(),
                description: "Daily soup".into(),
                unit_cost: 50,
            })
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await?;
        (pasta, soup)
    };

    // Another restaurant's product.
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/order",
            Some(&token),
            Some(json!({
                "customer_id": customer.id,
                "restaurant_id": rated,
                "products": [{ "id": soup.id, "quantity": 1 }]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        format!("Product with id {} not found or does not belong to the restaurant", soup.id)
    );

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/order",
            Some(&token),
            Some(json!({
                "customer_id": -1,
                "restaurant_id": rated,
                "products": [{ "id": pasta.id, "quantity": 1 }]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Customer with id -1 not found");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/order",
            Some(&token),
            Some(json!({
                "customer_id": customer.id,
                "restaurant_id": rated,
                "products": [{ "id": pasta.id, "quantity": 3 }]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Repricing after the fact leaves the order untouched.
    {
        let conn = &mut state.db_pool.get().await?;
        diesel::update(products::table.find(pasta.id))
            .set(products::unit_cost.eq(250))
            .execute(conn)
            .await?;
    }

    let (status, body) = send(
        &app,
        request("GET", &format!("/api/order?type=restaurant&id={rated}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["products"][0]["unit_cost"], 100);
    assert_eq!(orders[0]["products"][0]["total_cost"], 300);
    assert_eq!(orders[0]["total_cost"], 300);

    let (status, body) = send(
        &app,
        request("GET", &format!("/api/order?type=COURIER&id={}", user.id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    // Ratings: one order at 1 for the first restaurant, none for the second.
    let (status, body) = send(&app, request("GET", "/api/restaurants?rating=1", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = ids(&body);
    assert!(listed.contains(&i64::from(rated)));
    assert!(!listed.contains(&i64::from(quiet)));

    let (status, body) = send(
        &app,
        request("GET", "/api/restaurants?rating=0&price_range=2", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let listed = ids(&body);
    assert!(listed.contains(&i64::from(quiet)));
    assert!(!listed.contains(&i64::from(rated)));

    let (status, body) = send(
        &app,
        request("GET", "/api/restaurants?rating=0&price_range=3", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!ids(&body).contains(&i64::from(quiet)));

    // Unknown owner on update.
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/api/restaurants/{quiet}"),
            Some(&token),
            Some(restaurant_json(-1, "Quiet Kitchen", 2)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "User not found");

    for id in [rated, quiet] {
        let (status, _) = send(
            &app,
            request("DELETE", &format!("/api/restaurants/{id}"), Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    Ok(())
}
