//! HTTP protocol layer module
//!
//! Range parsing, conditional requests, content types and response building,
//! decoupled from storage and routing.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_404_response, build_405_response, build_health_response, build_options_response,
    ResponseBody,
};
