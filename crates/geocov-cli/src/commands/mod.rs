//! CLI command implementations.

pub mod convert;
pub mod run;
pub mod topics;
