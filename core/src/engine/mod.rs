pub mod evaluator;
pub mod lock;
pub mod optimizer;
pub mod redistribute;

pub use evaluator::{breakdown, evaluate, ChannelPrediction, PredictionResult};
pub use lock::LockSet;
pub use optimizer::{AllocationOptimizer, EfficiencyStrategy, GreedyStrategy, OptimizationResult};
pub use redistribute::redistribute;
