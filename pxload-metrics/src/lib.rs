pub mod aggregator;
pub mod histogram;
pub mod status;

pub use aggregator::{OutcomeAggregator, OutcomeSnapshot};
pub use histogram::LatencySummary;
pub use status::{StatusKey, TRANSPORT_ERROR_LABEL};
