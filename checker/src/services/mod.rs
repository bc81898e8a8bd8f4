pub mod node_service;
pub mod notifier;
pub mod project_tracker;

pub use node_service::{AddNodeRequest, NodeService, NodeView};
pub use notifier::{Notifier, WebhookNotifier};
pub use project_tracker::{ProjectDeviations, ProjectTracker};
