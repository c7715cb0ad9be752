//! Request rules and calculations that do not need a database connection.

pub mod order;
pub mod rating;
pub mod validation;
