//! CLI command implementations

pub mod hold;
pub mod run;
pub mod status;
