pub mod batch;
pub mod serve;

// Re-export command functions for convenience
pub use batch::{dispatch, summary};
pub use serve::{serve, ServeParams};
