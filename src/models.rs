use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Users

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserEntity {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct CreateUserEntity {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// Addresses

#[derive(
    Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema,
)]
#[diesel(table_name = crate::schema::addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressEntity {
    pub id: i32,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::addresses)]
pub struct CreateAddressEntity {
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
}

// Restaurants

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::restaurants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RestaurantEntity {
    pub id: i32,
    pub user_id: i32,
    pub address_id: i32,
    pub name: String,
    pub price_range: i32,
    pub phone: String,
    pub email: String,
    pub active: bool,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::restaurants)]
pub struct CreateRestaurantEntity {
    pub user_id: i32,
    pub address_id: i32,
    pub name: String,
    pub price_range: i32,
    pub phone: String,
    pub email: String,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::restaurants)]
pub struct UpdateRestaurantEntity {
    pub user_id: i32,
    pub name: String,
    pub price_range: i32,
    pub phone: String,
    pub email: String,
}

// Products

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: i32,
    pub restaurant_id: i32,
    pub name: String,
    pub description: String,
    pub unit_cost: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::products)]
pub struct CreateProductEntity {
    pub restaurant_id: i32,
    pub name: String,
    pub description: String,
    pub unit_cost: i32,
}

// Customers

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerEntity {
    pub id: i32,
    pub user_id: i32,
    pub address_id: i32,
    pub active: bool,
    pub phone: String,
    pub email: String,
    pub name: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::customers)]
pub struct CreateCustomerEntity {
    pub user_id: i32,
    pub address_id: i32,
    pub phone: String,
    pub email: String,
    pub name: String,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::order_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderStatusEntity {
    pub id: i32,
    pub name: String,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub restaurant_id: i32,
    pub customer_id: i32,
    pub status_id: i32,
    pub courier_id: Option<i32>,
    pub restaurant_rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct CreateOrderEntity {
    pub restaurant_id: i32,
    pub customer_id: i32,
    pub status_id: i32,
    pub restaurant_rating: i32,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::product_orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductOrderEntity {
    pub id: i32,
    pub product_id: i32,
    pub order_id: i32,
    pub product_quantity: i32,
    pub product_unit_cost: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::product_orders)]
pub struct CreateProductOrderEntity {
    pub product_id: i32,
    pub order_id: i32,
    pub product_quantity: i32,
    pub product_unit_cost: i32,
}
