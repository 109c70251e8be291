//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and upstream calls produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - API keys are masked before they reach a log field
//! - Metrics recording is a no-op until the exporter is installed

pub mod logging;
pub mod metrics;
