//! Partial, forward-only parsing of feed payloads
//!
//! The feed can be large compared to what a small device has to spare, so
//! nothing here deserializes a whole document. A [`StreamScanner`] walks the
//! body once and the field helpers pick out the handful of values the poller
//! cares about.

pub mod fields;
pub mod scanner;

pub use fields::{extract_string_field, parse_feed_event};
pub use scanner::StreamScanner;
