//! Energy Balance - Daily energy balance engine with confidence ranges
//!
//! Combines food-log intake, wearable signals and body weight history into a
//! daily report through a deterministic pipeline: metric extraction → RMR
//! estimation → expenditure breakdown → uncertainty propagation → report
//! assembly.
//!
//! ## Modules
//!
//! - **Pipeline**: Stateless JSON API and the configured [`EnergyBalanceProcessor`]
//! - **Providers**: Collaborator seams for profile, band and health-metric sources
//! - **Summary**: Dashboard view derived from a daily report

pub mod calibration;
pub mod config;
pub mod constants;
pub mod error;
pub mod expenditure;
pub mod extractor;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod rmr;
pub mod summary;
pub mod trend;
pub mod types;
pub mod uncertainty;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use calibration::{calibrate, CalibrationFactors, CalibrationStrategy, DefaultCalibration};
pub use config::EngineConfig;
pub use error::{ComputeError, ProviderError};
pub use pipeline::{compute_daily_metrics, daily_report_json, EnergyBalanceProcessor};
pub use summary::DashboardSummary;
pub use types::{DailyEnergyBalanceReport, DailyInput, Profile};

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
