#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod calibration;
pub mod device;
pub mod interface;
pub mod sampler;
pub mod source;
pub mod storage;

// Re-export main types
pub use calibration::{
    CalibrationEngine, CalibrationPoint, CalibrationStore, Segment, WriteOutcome,
};
pub use device::{OrpConfig, OrpSensor};
pub use interface::{I2cAdc, SpiAdc};
pub use sampler::TrimmedMeanSampler;
pub use source::{AdcSource, AnalogInput, ExternalAdc, NoExternalAdc, SourceKind};
pub use storage::NvMemory;

/// Largest magnitude accepted for a calibration value (both reference and actual)
///
/// Persisted magnitudes occupy the low 14 bits of a word, so anything beyond
/// this limit is rejected before it reaches the non-volatile medium.
pub const VALUE_LIMIT: i16 = 1999;

/// Bytes occupied by one calibration slot in non-volatile memory
pub const SLOT_SIZE: u16 = 4;

/// Word value of never-written (erased) non-volatile memory
pub const ERASED_WORD: u16 = 0xFFFF;

/// Default I2C address of an ADS1115-style converter (ADDR pin tied to GND)
pub const I2C_ADDRESS_ADDR_GND: u8 = 0x48;

/// Alternative I2C address of an ADS1115-style converter (ADDR pin tied to VDD)
pub const I2C_ADDRESS_ADDR_VDD: u8 = 0x49;

/// Driver errors
///
/// `E` is the error type of the non-volatile memory. Acquisition failures
/// are classified by the source that produced them because the three
/// back ends report errors of unrelated types.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Non-volatile memory reported a failure
    Storage(E),
    /// Internal analog input failed to convert
    Analog,
    /// SPI converter communication error
    Spi,
    /// I2C converter communication error
    I2c,
    /// Invalid configuration parameter
    InvalidConfig,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Storage(error)
    }
}
