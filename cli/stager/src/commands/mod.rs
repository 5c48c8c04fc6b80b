//! CLI command implementations.

pub mod check;
pub mod clean;
pub mod init;
pub mod inspect;
pub mod plan;
pub mod specialize;
