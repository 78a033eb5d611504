use std::sync::Arc;

use actix_web::web;

use crate::aggregation::Aggregator;
use crate::database::Store;
use crate::monitoring::{CheckCycleRunner, Scheduler};

pub mod health;
pub mod query;
pub mod trigger;

/// Shared handler state, built once at the composition root.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub runner: Arc<CheckCycleRunner>,
    pub scheduler: Arc<Scheduler>,
    pub aggregator: Aggregator,
    pub cron_secret: Option<String>,
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health_route).service(
        web::scope("/api")
            .service(trigger::run_cycle)
            .service(trigger::start_scheduler)
            .service(trigger::stop_scheduler)
            .service(query::list_endpoints)
            .service(query::day_detail)
            .service(query::status_rollup),
    );
}
