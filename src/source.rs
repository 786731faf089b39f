//! Acquisition sources
//!
//! The ORP amplifier (LMP91200 style) presents the potential as the
//! difference between its VOUT pin and its VOCM reference midpoint. That
//! difference can be digitised three ways:
//!
//! - **Internal**: the microcontroller's own converter reads both pins; the
//!   burst is filtered by [`TrimmedMeanSampler`]
//! - **External SPI**: a differential SPI converter, see [`SpiAdc`](crate::SpiAdc)
//! - **External I2C**: a differential I2C converter, see [`I2cAdc`](crate::I2cAdc)
//!
//! Exactly one source is active at a time.

use crate::Error;
use crate::sampler::TrimmedMeanSampler;

/// Analog input of the microcontroller's own converter
///
/// # Example Implementation
///
/// ```ignore
/// impl AnalogInput for AvrAdc {
///     type Error = core::convert::Infallible;
///
///     fn read_channel(&mut self, channel: u8) -> Result<u16, Self::Error> {
///         Ok(self.adc.read_blocking(channel))
///     }
/// }
/// ```
pub trait AnalogInput {
    /// Conversion error
    type Error;

    /// Convert one reading on `channel`
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    fn read_channel(&mut self, channel: u8) -> Result<u16, Self::Error>;
}

/// External converter that already delivers a signed differential value
pub trait ExternalAdc {
    /// Bus or conversion error
    type Error;

    /// Read the latest converted value
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the converter fails.
    fn read_converted(&mut self) -> Result<i32, Self::Error>;
}

/// Placeholder for an external source slot that is never used
///
/// The type has no values, so an [`AdcSource`] using it can never select that
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoExternalAdc {}

impl ExternalAdc for NoExternalAdc {
    type Error = core::convert::Infallible;

    fn read_converted(&mut self) -> Result<i32, Self::Error> {
        match *self {}
    }
}

/// Analog channels of the internal differential measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DifferentialChannels {
    /// Channel wired to the amplifier output (non-inverting input)
    pub vout: u8,
    /// Channel wired to the reference midpoint
    pub vocm: u8,
}

impl DifferentialChannels {
    /// Read both channels once and return `VOUT - VOCM` in converter counts
    ///
    /// # Errors
    ///
    /// Returns an error if either conversion fails.
    pub fn read<A: AnalogInput>(&self, analog: &mut A) -> Result<i32, A::Error> {
        let vout = analog.read_channel(self.vout)?;
        let vocm = analog.read_channel(self.vocm)?;
        Ok(i32::from(vout) - i32::from(vocm))
    }
}

/// Which acquisition source is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceKind {
    /// Microcontroller's own converter with trimmed-mean filtering
    Internal,
    /// External SPI converter
    ExternalSpi,
    /// External I2C converter
    ExternalI2c,
}

/// Active acquisition source
///
/// Only the active external converter is held; the internal converter is
/// owned by the sensor for its whole lifetime.
#[derive(Debug)]
pub enum AdcSource<S, I> {
    /// Internal converter
    Internal,
    /// External SPI converter
    ExternalSpi(S),
    /// External I2C converter
    ExternalI2c(I),
}

impl<S, I> Default for AdcSource<S, I> {
    fn default() -> Self {
        Self::Internal
    }
}

impl<S, I> AdcSource<S, I> {
    /// Kind of this source
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Internal => SourceKind::Internal,
            Self::ExternalSpi(_) => SourceKind::ExternalSpi,
            Self::ExternalI2c(_) => SourceKind::ExternalI2c,
        }
    }
}

impl<S, I> AdcSource<S, I>
where
    S: ExternalAdc,
    I: ExternalAdc,
{
    /// Acquire one raw sample, `VOUT - VOCM`, from this source
    ///
    /// The internal converter is read through `sampler`; external converters
    /// return their converted value as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Analog`], [`Error::Spi`] or [`Error::I2c`] depending
    /// on which source failed. The collaborator's own error types differ per
    /// source and are not carried; with the `defmt` feature the failing
    /// source is logged.
    pub fn acquire<A, E>(
        &mut self,
        analog: &mut A,
        channels: DifferentialChannels,
        sampler: &TrimmedMeanSampler,
    ) -> Result<i32, Error<E>>
    where
        A: AnalogInput,
    {
        #[cfg(feature = "defmt")]
        let kind = self.kind();
        let result = match self {
            Self::Internal => sampler
                .sample(|| channels.read(analog))
                .map_err(|_| Error::Analog),
            Self::ExternalSpi(adc) => adc.read_converted().map_err(|_| Error::Spi),
            Self::ExternalI2c(adc) => adc.read_converted().map_err(|_| Error::I2c),
        };

        #[cfg(feature = "defmt")]
        if result.is_err() {
            defmt::warn!("Acquisition failed on {} source", kind);
        }

        result
    }
}
