pub mod bridge;
pub mod model;

pub use bridge::{default_bind_address, PlannerBridge};
