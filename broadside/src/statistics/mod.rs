pub mod distribution;
pub mod query;
pub mod roller;
