//! # scholarmetrics
//!
//! Citation metrics for one Google Scholar author, served as JSON.
//!
//! ## Modules
//!
//! - [`strategy`] - data sources (SerpApi, profile scraping, snapshot)
//! - [`resolver`] - ordered fallback across strategies
//! - [`normalize`] - payload normalization and h-index / i10-index derivation
//! - [`fields`] - ranked field locations for the unstable upstream schema
//! - [`snapshot`] - last-known-good payload persistence
//! - [`server`] - axum endpoint
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scholarmetrics::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let strategies = config.build_strategies()?;
//!     let metrics = config
//!         .build_resolver()
//!         .resolve(&config.author_id, &strategies)
//!         .await;
//!     println!("{} citations, h-index {}", metrics.citation_count, metrics.h_index);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fields;
pub mod http;
pub mod models;
pub mod normalize;
pub mod resolver;
pub mod server;
pub mod snapshot;
pub mod strategy;

pub use error::{MetricsError, Result};
pub use models::{AuthorMetrics, Paper, YearCitations};
pub use resolver::{ReconcileMode, Resolver};
