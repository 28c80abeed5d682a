pub mod point;
pub mod snapshot;
