use std::sync::Arc;

use config::Config;
use database::InstanceRepository;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod result;
pub mod router;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub instances: Arc<dyn InstanceRepository>,
}
