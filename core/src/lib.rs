//! Budget allocation engine for marketing-mix planning.
//!
//! Channels carry step-sampled response curves; the engine evaluates any
//! allocation against them, searches for better allocations under per-channel
//! bounds and a total budget, and redistributes budget around locked channels.
//! Every operation is a synchronous function of its inputs.

pub mod engine;
pub mod math;
pub mod model;
pub mod prelude;
pub mod scenario;
pub mod telemetry;

pub use engine::{evaluate, redistribute, AllocationOptimizer, LockSet, PredictionResult};
pub use model::{Allocation, Channel, CurvePoint, ResponseCurve};
pub use prelude::{AllocationStrategy, Objective, PlanError, PlanResult};
pub use scenario::{InMemoryScenarioStore, Scenario, ScenarioStore};
