//! Structured logging setup for the `samlauth` binary.

mod tracing_init;

pub use tracing_init::*;
