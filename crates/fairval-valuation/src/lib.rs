//! # Fairval Valuation
//!
//! Fair-value estimation on top of [`fairval_core`] acquisition.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Model and pipeline settings |
//! | [`dcf`] | Three-phase discounted cash flow |
//! | [`error`] | Valuation error taxonomy |
//! | [`inputs`] | Validated simulation inputs |
//! | [`monte_carlo`] | DCF/PE fusion over randomized assumptions |
//! | [`pe`] | Growth- and peer-adjusted PE |
//! | [`pipeline`] | Fetch, simulate and report for one listing |
//! | [`result`] | Valuation result and flat report |
//! | [`stats`] | Percentiles and moments |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fairval_core::AdapterRegistryBuilder;
//! use fairval_valuation::{PipelineConfig, ValuationPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = AdapterRegistryBuilder::from_env().build();
//!     let pipeline = ValuationPipeline::from_config(registry, &PipelineConfig::default())?;
//!
//!     let report = pipeline.analyze("AAPL", "US").await?;
//!     println!("{}: {:.2} - {:.2}", report.symbol, report.low, report.high);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dcf;
pub mod error;
pub mod inputs;
pub mod monte_carlo;
pub mod pe;
pub mod pipeline;
pub mod result;
pub mod stats;

pub use config::{ModelConfig, PipelineConfig};
pub use dcf::{DcfValuation, TRANSITION_YEARS};
pub use error::ValuationError;
pub use inputs::{SimulationDraw, ValuationInputs, DEFAULT_REFERENCE_PE, MAX_REFERENCE_PE};
pub use monte_carlo::MonteCarloEngine;
pub use pe::{PeValuation, REFERENCE_PE};
pub use pipeline::ValuationPipeline;
pub use result::{
    format_report_date, ValuationProbabilities, ValuationRange, ValuationReport, ValuationResult,
    FALLBACK_REPORT_DATE,
};
