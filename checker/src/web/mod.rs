pub mod handlers;
pub mod server;

pub use server::{create_router, start_web_server};

use std::sync::Arc;

use crate::config::Config;
use crate::health::HealthMonitor;
use crate::services::NodeService;

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub node_service: Arc<NodeService>,
    pub health_monitor: Arc<HealthMonitor>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        node_service: Arc<NodeService>,
        health_monitor: Arc<HealthMonitor>,
    ) -> Self {
        Self {
            config,
            node_service,
            health_monitor,
        }
    }
}
