//! Upstream Feed
//!
//! WebSocket client for the upstream price streamer.
//!
//! # Components
//!
//! - [`TickSource`]: Connection loop, frame decoding and interest updates
//! - [`codec`]: Base64 unwrapping and the record decoder
//! - [`ReconnectStrategy`]: Delay policy between connection attempts
//! - [`HeartbeatManager`]: Pings and idle detection
//! - [`PinnedInterest`]: Hub-driven interest that keeps default symbols

pub mod codec;
mod heartbeat;
mod interest;
mod messages;
mod reconnect;
mod source;
mod state;

pub use codec::{DecodeError, decode_frame, decode_tick};
pub use heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
pub use interest::PinnedInterest;
pub use messages::{FeedEnvelope, FeedRequest};
pub use reconnect::{
    BackoffConfig, ExponentialBackoff, FixedDelay, ReconnectSettings, ReconnectStrategy,
};
pub use source::{DEFAULT_FEED_URL, FeedError, TickSource, TickSourceConfig};
pub use state::{ConnectionState, FeedState, FeedStatus};
