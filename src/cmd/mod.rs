//! Command-line argument types for the `wclite` binary.

pub mod wclite;
