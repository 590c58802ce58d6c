//! Recognize ASL hand letters on webcam frames and type them into a text.
//!
//! Every posted frame goes through [`pipeline::FramePipeline`], the detected letter is debounced by
//! [`debounce::Session`] and typed once it is held long enough.
pub mod debounce;
pub mod endpoints;
pub mod error;
pub mod hand;
pub mod labels;
pub mod nn;
pub mod pipeline;
pub mod preproc;
pub mod stats;
pub mod utils;
