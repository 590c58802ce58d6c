//! Common code shared between `asl_server` and `frame_sender`.
pub mod protocol;

/// Error type.
pub type Error = Box<dyn std::error::Error>;
