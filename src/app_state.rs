use std::sync::Arc;

use crate::{auth::JwtKeys, db::DbPool};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(db_pool: DbPool, jwt: JwtKeys) -> Self {
        Self {
            db_pool,
            jwt: Arc::new(jwt),
        }
    }
}
