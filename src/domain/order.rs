use std::{collections::HashSet, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status every new order starts in.
pub const INITIAL_STATUS: &str = "in progress";

/// Rating stored on new orders until the customer rates the restaurant.
pub const INITIAL_RESTAURANT_RATING: i32 = 1;

/// Which participant an order listing is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOwner {
    Customer,
    Restaurant,
    Courier,
}

impl FromStr for OrderOwner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(OrderOwner::Customer),
            "restaurant" => Ok(OrderOwner::Restaurant),
            "courier" => Ok(OrderOwner::Courier),
            other => Err(format!("Invalid type: {other}")),
        }
    }
}

/// One requested `(product, quantity)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub struct LineRequest {
    /// Product id.
    pub id: i32,
    pub quantity: i32,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("An order needs at least one product")]
    Empty,
    #[error("Quantity for product {0} must be at least 1")]
    Quantity(i32),
    #[error("Product {0} appears more than once in the order")]
    Duplicate(i32),
}

pub fn check_lines(lines: &[LineRequest]) -> Result<(), LineError> {
    if lines.is_empty() {
        return Err(LineError::Empty);
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.quantity < 1 {
            return Err(LineError::Quantity(line.id));
        }
        if !seen.insert(line.id) {
            return Err(LineError::Duplicate(line.id));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderLineView {
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_cost: i32,
    pub total_cost: i64,
}

impl OrderLineView {
    pub fn new(product_id: i32, product_name: String, quantity: i32, unit_cost: i32) -> Self {
        Self {
            product_id,
            product_name,
            quantity,
            unit_cost,
            total_cost: i64::from(quantity) * i64::from(unit_cost),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    pub id: i32,
    pub customer_id: i32,
    pub restaurant_id: i32,
    pub courier_id: Option<i32>,
    pub status: String,
    pub products: Vec<OrderLineView>,
    pub total_cost: i64,
}

impl OrderView {
    pub fn new(
        id: i32,
        customer_id: i32,
        restaurant_id: i32,
        courier_id: Option<i32>,
        status: String,
        products: Vec<OrderLineView>,
    ) -> Self {
        let total_cost = products.iter().map(|line| line.total_cost).sum();
        Self {
            id,
            customer_id,
            restaurant_id,
            courier_id,
            status,
            products,
            total_cost,
        }
    }
}
