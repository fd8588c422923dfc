//! Moving-object tracking.
//!
//! The feed client fetches a JSON document of tracked flights, the poller
//! runs it on a timer and publishes each successful result as one immutable
//! [`TrackerSnapshot`] the canvas can read without blocking.

mod feed;
mod poller;
mod types;

pub use feed::HttpFeedSource;
pub use poller::FeedPoller;
pub use types::{FeedStatus, MovingObject, TrackerSnapshot};
