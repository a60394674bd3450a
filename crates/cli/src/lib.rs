//! The `streamctl` command-line controller.

pub mod app;
pub mod cli;
pub mod input;
pub mod logging;
