mod error;
mod pass_finder;
mod propagation;
mod tle_loader;
mod types;

pub use error::PredictError;
pub use pass_finder::{predict_passes, PassScanner};
pub use propagation::{observe_at, Propagate};
pub use tle_loader::{TleEntry, TleLoader};

#[cfg(test)]
pub(crate) use tle_loader::parse_tle_text;
pub use types::{Pass, PassSummary};
