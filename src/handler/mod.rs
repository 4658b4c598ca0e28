//! Request handler module
//!
//! Routing plus the two media responders: object streaming and bucket listing.

pub mod listing;
pub mod router;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main entry point
pub use router::handle_request;
