//! Client feeding webcam or image file frames to the ASL letter server.
pub mod client;
pub mod sensors;

/// Error type.
pub type Error = Box<dyn std::error::Error>;
