pub mod allocation;
pub mod channel;
pub mod curve;

pub use allocation::Allocation;
pub use channel::Channel;
pub use curve::{CurvePoint, ResponseCurve};
