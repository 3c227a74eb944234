// Tamarin Tuning Library
// Parameter binding and Nadam gradient descent for evaluation weights

pub mod asgd;
pub mod dataset;
pub mod error;
pub mod params;

// Re-export commonly used types
pub use asgd::{Asgd, AsgdBuilder, StepOutcome};
pub use dataset::{load_epd, prediction_error, win_expectancy, LabeledPosition};
pub use error::{Result, TuningError};
pub use params::{ParamSet, ParamValue};
