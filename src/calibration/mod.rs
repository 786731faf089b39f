//! Calibration points, their persistence, and the correction function
//!
//! - [`point`]: the calibration point type and its 4-byte persisted encoding
//! - [`engine`]: selection, ordering and piecewise-linear evaluation
//! - [`store`]: slots held in non-volatile memory, kept in sync with the engine
//!
//! All calibration operations on a live sensor go through `OrpSensor`.

pub mod engine;
pub mod point;
pub mod store;

// Re-export main types
pub use engine::{CalibrationEngine, Segment};
pub use point::CalibrationPoint;
pub use store::{CalibrationStore, WriteOutcome};
