mod handler;
mod model;

pub use handler::{heartbeat, list_instances};
pub use model::{HeartbeatRequest, InstanceList};
