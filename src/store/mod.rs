//! Result storage: per-task outcomes and the order-restoring aggregator

mod outcome;
mod results;

pub use outcome::{Failure, Outcome, Success};
pub use results::ResultSet;
