//! Building blocks of the `cookbook` binary.
pub mod api;
pub mod config;
pub mod logging;
pub mod summary;
