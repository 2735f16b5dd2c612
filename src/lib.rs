//! Dalimaster desktop runner: everything that happens before the UI takes over.
pub mod association;
pub mod cli;
pub mod logging;
pub mod project;
