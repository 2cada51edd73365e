//! Parley is a terminal chat client for a single streaming inference endpoint.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the transcript model, the incremental stream decoder, the
//!   accumulator that folds decoded tokens into the transcript, markdown
//!   normalization, persistence and the session controller.
//! - [`ui`] renders normalized markdown into terminal lines and runs the
//!   interactive event loop.
//! - [`api`] defines the request payload sent to the endpoint.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
