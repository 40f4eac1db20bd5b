pub mod aggregation;
pub mod anomaly;
pub mod face;
pub mod monthly;
