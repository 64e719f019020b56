use std::sync::Arc;

use crate::db::{DbPool, OrmConn};
use crate::payments::PaymentProcessor;
use crate::retry::RetryPolicy;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub payments: Arc<dyn PaymentProcessor>,
    pub webhook_secret: String,
    pub webhook_tolerance_secs: i64,
    pub currency: String,
    pub retry: RetryPolicy,
}
