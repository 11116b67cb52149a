pub mod census;
pub mod election;
pub mod error;
pub mod load;
pub mod plan;
pub mod sql;
