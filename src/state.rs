use std::sync::Arc;

use sqlx::PgPool;

use crate::approval::{ApprovalGate, AuditLogService};
use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub login_limiter: LoginRateLimiter,
    pub audit: AuditLogService,
    pub gate: ApprovalGate,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let audit = AuditLogService::new(pool.clone());
        let gate = ApprovalGate::new(pool.clone(), audit.clone());
        Self {
            pool,
            config,
            login_limiter: LoginRateLimiter::new(),
            audit,
            gate,
        }
    }
}
