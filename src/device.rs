//! High-level driver API for the ORP sensor
//!
//! This module ties together the acquisition source, the trimmed-mean
//! sampler and the persisted calibration. It is the only place where
//! calibration points should be changed on a running system.

use crate::calibration::{CalibrationEngine, CalibrationPoint, CalibrationStore, WriteOutcome};
use crate::interface::{I2cAdc, SpiAdc};
use crate::sampler::TrimmedMeanSampler;
use crate::source::{
    AdcSource, AnalogInput, DifferentialChannels, ExternalAdc, NoExternalAdc, SourceKind,
};
use crate::storage::NvMemory;
use crate::{Error, SLOT_SIZE};

/// Default slot capacity of [`OrpSensor`]
pub const DEFAULT_CAPACITY: usize = 8;

/// Sensor configuration
///
/// Fixed for the lifetime of an [`OrpSensor`]. `point_count` and
/// `base_address` determine the non-volatile byte range
/// `[base_address, base_address + point_count * 4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OrpConfig {
    /// Analog channel wired to the amplifier output (VOUT)
    pub vout_pin: u8,
    /// Analog channel wired to the reference midpoint (VOCM)
    pub vocm_pin: u8,
    /// Number of calibration slots (1..=capacity)
    pub point_count: u8,
    /// First byte of the calibration image in non-volatile memory
    pub base_address: u16,
    /// Reference voltage of the internal converter in millivolts
    pub reference_voltage_mv: u16,
    /// Resolution of the internal converter in bits (1..=16)
    pub adc_bits: u8,
}

impl Default for OrpConfig {
    fn default() -> Self {
        Self {
            vout_pin: 0,
            vocm_pin: 1,
            point_count: 5,
            base_address: 0,
            reference_voltage_mv: 5000, // 5V AVR supply
            adc_bits: 10,
        }
    }
}

impl OrpConfig {
    /// Configuration for a 3.3V board with a 12-bit converter
    #[must_use]
    pub const fn vref_3v3_12bit(vout_pin: u8, vocm_pin: u8) -> Self {
        Self {
            vout_pin,
            vocm_pin,
            point_count: 5,
            base_address: 0,
            reference_voltage_mv: 3300,
            adc_bits: 12,
        }
    }

    /// Number of bytes occupied by the calibration image
    #[must_use]
    pub const fn image_size(&self) -> u32 {
        self.point_count as u32 * SLOT_SIZE as u32
    }

    /// Check the configuration against a slot capacity
    #[must_use]
    pub const fn is_valid(&self, capacity: usize) -> bool {
        let end = self.base_address as u32 + self.image_size();
        self.point_count >= 1
            && (self.point_count as usize) <= capacity
            && self.adc_bits >= 1
            && self.adc_bits <= 16
            && self.reference_voltage_mv > 0
            && end <= u16::MAX as u32 + 1
    }

    const fn channels(&self) -> DifferentialChannels {
        DifferentialChannels {
            vout: self.vout_pin,
            vocm: self.vocm_pin,
        }
    }
}

/// Main driver for an ORP sensor
///
/// - `M`: non-volatile memory holding the calibration image
/// - `A`: internal analog converter
/// - `S`, `I`: external SPI and I2C converters (default: none)
/// - `N`: calibration slot capacity
pub struct OrpSensor<
    M,
    A,
    S = NoExternalAdc,
    I = NoExternalAdc,
    const N: usize = DEFAULT_CAPACITY,
> {
    config: OrpConfig,
    store: CalibrationStore<M, N>,
    analog: A,
    sampler: TrimmedMeanSampler,
    source: AdcSource<S, I>,
}

impl<M, A, S, I, const N: usize> OrpSensor<M, A, S, I, N>
where
    M: NvMemory,
    A: AnalogInput,
    S: ExternalAdc,
    I: ExternalAdc,
{
    /// Create a sensor and load its calibration
    ///
    /// The calibration image is read from `memory` and the correction
    /// function built from it. The internal converter is the active source.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid for capacity `N` ([`Error::InvalidConfig`])
    /// - Reading the non-volatile memory fails ([`Error::Storage`])
    pub fn new(config: OrpConfig, memory: M, analog: A) -> Result<Self, Error<M::Error>> {
        if !config.is_valid(N) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Rejected ORP configuration: {}", config);
            return Err(Error::InvalidConfig);
        }

        let store = CalibrationStore::load(memory, config.base_address, config.point_count)?;

        Ok(Self {
            config,
            store,
            analog,
            sampler: TrimmedMeanSampler::new(config.reference_voltage_mv, config.adc_bits),
            source: AdcSource::Internal,
        })
    }

    /// Read the sensor
    ///
    /// One raw sample is acquired from the active source. With
    /// `apply_calibration` the sample is passed through the calibration;
    /// with fewer than two usable points this is an identity or a constant
    /// offset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Analog`], [`Error::Spi`] or [`Error::I2c`] if the
    /// active source fails.
    pub fn get_reading(&mut self, apply_calibration: bool) -> Result<i32, Error<M::Error>> {
        let raw = self.read_raw()?;
        if !apply_calibration {
            return Ok(raw);
        }
        Ok(self.store.evaluate(raw))
    }

    /// Read the sensor without calibration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Analog`], [`Error::Spi`] or [`Error::I2c`] if the
    /// active source fails.
    pub fn read_raw(&mut self) -> Result<i32, Error<M::Error>> {
        self.source
            .acquire(&mut self.analog, self.config.channels(), &self.sampler)
    }

    /// Store a calibration point
    ///
    /// Returns [`WriteOutcome::Rejected`] when `index` is not below the point
    /// count or a value lies outside `[-1999, 1999]`, and
    /// [`WriteOutcome::Unchanged`] when the point equals the stored one. In
    /// both cases nothing is written.
    ///
    /// The write blocks until the medium finished. On targets where
    /// interrupt handlers also use the medium, call this inside a critical
    /// section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the medium reports a failed write; the
    /// calibration in use is left unchanged.
    pub fn set_calibration_point(
        &mut self,
        index: u8,
        point: CalibrationPoint,
    ) -> Result<WriteOutcome, Error<M::Error>> {
        Ok(self.store.write(index, point)?)
    }
}

impl<M, A, S, I, const N: usize> OrpSensor<M, A, S, I, N> {
    /// Use the internal converter with trimmed-mean filtering
    ///
    /// Returns the previously active source so an external bus can be
    /// released. Calibration is not affected.
    pub fn select_internal_source(&mut self) -> AdcSource<S, I> {
        self.select_source(AdcSource::Internal)
    }

    /// Use an external SPI converter
    ///
    /// Returns the previously active source. Calibration is not affected.
    pub fn select_external_spi_source(&mut self, adc: S) -> AdcSource<S, I> {
        self.select_source(AdcSource::ExternalSpi(adc))
    }

    /// Use an external I2C converter
    ///
    /// Returns the previously active source. Calibration is not affected.
    pub fn select_external_i2c_source(&mut self, adc: I) -> AdcSource<S, I> {
        self.select_source(AdcSource::ExternalI2c(adc))
    }

    /// Replace the active source, returning the previous one
    pub fn select_source(&mut self, source: AdcSource<S, I>) -> AdcSource<S, I> {
        #[cfg(feature = "defmt")]
        defmt::info!(
            "ORP source: {} -> {}",
            self.source.kind(),
            source.kind()
        );
        core::mem::replace(&mut self.source, source)
    }

    /// Kind of the active source
    #[must_use]
    pub const fn active_source(&self) -> SourceKind {
        self.source.kind()
    }

    /// Calibration point in slot `index`
    ///
    /// Returns a disabled point `{false, 0, 0}` if `index` is out of range.
    #[must_use]
    pub fn calibration_point(&self, index: u8) -> CalibrationPoint {
        self.store.point(index)
    }

    /// Correction in use, for diagnostics
    #[must_use]
    pub const fn calibration(&self) -> &CalibrationEngine<N> {
        self.store.engine()
    }

    /// Number of calibration slots
    #[must_use]
    pub const fn point_count(&self) -> u8 {
        self.config.point_count
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &OrpConfig {
        &self.config
    }

    /// Trimmed-mean sampler used by the internal converter
    #[must_use]
    pub const fn sampler(&self) -> &TrimmedMeanSampler {
        &self.sampler
    }

    /// Consume the sensor and return the memory, the internal converter and
    /// the active source
    pub fn release(self) -> (M, A, AdcSource<S, I>) {
        (self.store.release(), self.analog, self.source)
    }
}

/// Sensor with the bundled SPI and I2C adapters as its external sources
pub type OrpSensorWithBus<M, A, SPI, I2C, const N: usize = DEFAULT_CAPACITY> =
    OrpSensor<M, A, SpiAdc<SPI>, I2cAdc<I2C>, N>;
