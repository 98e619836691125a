mod follow;
mod types;

pub use follow::follow;
pub use types::{FollowOptions, TrackEvent};
