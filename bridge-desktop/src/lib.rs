//! # Desktop Bridge Implementations
//!
//! Native implementations of the `bridge-traits` capabilities:
//!
//! - [`ReqwestHttpClient`] - HTTP via reqwest with retry and streaming
//! - [`TerminalPrompt`] - yes/no confirmation on the controlling terminal

pub mod http;
pub mod prompt;

pub use http::ReqwestHttpClient;
pub use prompt::TerminalPrompt;
