//! Core types and trait definitions for the Podium standings engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Verified results go in, medal tallies, rankings and overall champions come
//! out. Storage is abstracted behind [`store::StandingsStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod champion;
pub mod engine;
pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod lock;
pub mod placement;
pub mod ranking;
pub mod scope;
pub mod stats;
pub mod store;
pub mod tally;

pub use engine::{Engine, EngineConfig};
pub use error::{Error, Result};
