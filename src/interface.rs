//! Bus adapters for external converters
//!
//! These adapters implement [`ExternalAdc`] for differential converters on
//! SPI and I2C. They only fetch the latest conversion; configuring the
//! converter beyond that is left to the application.

use crate::source::ExternalAdc;
use crate::{I2C_ADDRESS_ADDR_GND, I2C_ADDRESS_ADDR_VDD};

/// Conversion result register of an ADS1115-style converter
const CONVERSION_REGISTER: u8 = 0x00;

/// Configuration register of an ADS1115-style converter
const CONFIG_REGISTER: u8 = 0x01;

/// Default resolution of the SPI converter (ADC141S626)
pub const SPI_DEFAULT_RESOLUTION: u8 = 14;

/// I2C differential converter (ADS1115 style)
///
/// Reads the signed 16-bit big-endian conversion register.
pub struct I2cAdc<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cAdc<I2C> {
    /// Create a new I2C converter with the default address (0x48, ADDR pin to GND)
    ///
    /// # Arguments
    /// * `i2c` - The I2C peripheral
    ///
    /// # Example
    /// ```ignore
    /// let adc = I2cAdc::default(i2c);
    /// sensor.select_external_i2c_source(adc);
    /// ```
    pub const fn default(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS_ADDR_GND,
        }
    }

    /// Create a new I2C converter with the alternative address (0x49, ADDR pin to VDD)
    ///
    /// # Arguments
    /// * `i2c` - The I2C peripheral
    pub const fn alternative(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS_ADDR_VDD,
        }
    }

    /// Create a new I2C converter with a custom device address
    ///
    /// # Arguments
    /// * `i2c` - The I2C peripheral
    /// * `address` - The I2C device address
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Device address in use
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Consume the adapter and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> I2cAdc<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    /// Write the converter's 16-bit configuration register
    ///
    /// Use this once after power-up to select the input pair, gain and
    /// continuous conversion mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transfer fails.
    pub fn write_config(&mut self, config: u16) -> Result<(), E> {
        let [high, low] = config.to_be_bytes();
        self.i2c.write(self.address, &[CONFIG_REGISTER, high, low])
    }
}

impl<I2C, E> ExternalAdc for I2cAdc<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;

    fn read_converted(&mut self) -> Result<i32, Self::Error> {
        let mut data = [0u8; 2];
        self.i2c
            .write_read(self.address, &[CONVERSION_REGISTER], &mut data)?;
        Ok(i32::from(i16::from_be_bytes(data)))
    }
}

/// SPI differential converter (ADC141S626 style)
///
/// Each read clocks out one 16-bit big-endian frame holding a left-justified
/// two's-complement result of the configured resolution.
///
/// # Note on Chip Select
///
/// This adapter uses the `SpiDevice` trait from `embedded-hal`, which manages
/// the chip select (CS) pin automatically. If using `embedded-hal-bus`, you
/// would typically create an `SpiDevice` like:
/// ```ignore
/// let spi_device = embedded_hal_bus::spi::ExclusiveDevice::new(spi_bus, cs_pin, delay);
/// let adc = SpiAdc::new(spi_device);
/// ```
pub struct SpiAdc<SPI> {
    spi: SPI,
    resolution_bits: u8,
}

impl<SPI> SpiAdc<SPI> {
    /// Create a new SPI converter with the default 14-bit resolution
    pub const fn new(spi: SPI) -> Self {
        Self {
            spi,
            resolution_bits: SPI_DEFAULT_RESOLUTION,
        }
    }

    /// Create a new SPI converter with a custom resolution (clamped to 1..=16 bits)
    pub fn with_resolution(spi: SPI, resolution_bits: u8) -> Self {
        Self {
            spi,
            resolution_bits: resolution_bits.clamp(1, 16),
        }
    }

    /// Result width in bits
    #[must_use]
    pub const fn resolution_bits(&self) -> u8 {
        self.resolution_bits
    }

    /// Consume the adapter and return the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI, E> ExternalAdc for SpiAdc<SPI>
where
    SPI: embedded_hal::spi::SpiDevice<Error = E>,
{
    type Error = E;

    fn read_converted(&mut self) -> Result<i32, Self::Error> {
        let mut frame = [0u8; 2];
        self.spi.read(&mut frame)?;
        // Arithmetic shift keeps the sign of the left-justified result
        let value = i16::from_be_bytes(frame) >> (16 - self.resolution_bits);
        Ok(i32::from(value))
    }
}
