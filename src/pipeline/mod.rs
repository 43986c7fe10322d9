//! Request pipeline module.
//!
//! [`RequestPipeline`] turns a raw topic into a [`PipelineOutcome`]: an HTML
//! fragment (content or error) plus an optional audio path.  It never fails
//! and keeps no state between requests.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use topic_explainer::config::AppConfig;
//! use topic_explainer::pipeline::RequestPipeline;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = Arc::new(RequestPipeline::from_config(&AppConfig::default()));
//!     let outcome = pipeline.handle("volcanoes").await;
//!     println!("{:?}", outcome.audio_path);
//! }
//! ```

pub mod outcome;
pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use outcome::{PipelineOutcome, RenderedResponse, Topic};
pub use runner::{AudioTarget, RequestPipeline};
