//! Telegram Check View.
//!
//! A small HTTP service reporting how many times a Telegram message was
//! viewed and how people reacted to it. The heavy lifting (MTProto,
//! authentication, reconnects) belongs to `grammers`; this crate owns the
//! session lifecycle, the HTTP contract and the shaping of the results.
//!
//! ```text
//! GET /api/message?peer=durov&id=42
//! {"views":1532,"title":"Durov's Channel","totalReactions":5,
//!  "reactions":[{"count":3,"reaction":"👍"},{"count":2,"reaction":"❤️"}]}
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`telegram`]: Session management and the Telegram client
//! - [`stats`]: Request validation and response assembly
//! - [`api`]: HTTP API and its OpenAPI documentation
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod stats;
pub mod telegram;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result, TelegramError};
