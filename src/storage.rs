//! Non-volatile memory access
//!
//! Calibration points live in a small byte-addressed non-volatile medium,
//! typically an on-chip EEPROM. The store only needs word-sized reads and
//! writes at absolute byte addresses, so that is all this trait asks for.

/// Byte-addressed non-volatile memory holding the calibration image
///
/// Words are stored little-endian, matching AVR EEPROM word access, so an
/// image written by earlier firmware reads back unchanged.
///
/// # Blocking
///
/// Implementations busy-wait until the medium is ready before every access
/// and return only once the operation completed. There is no timeout and no
/// retry. A medium that can detect a failed write reports it through
/// `Self::Error`.
///
/// # Interrupts
///
/// A word write must not be interrupted halfway. On targets where interrupt
/// handlers may touch the same medium, run [`write_word`](Self::write_word)
/// inside a critical section.
///
/// # Example Implementation
///
/// ```ignore
/// impl NvMemory for AvrEeprom {
///     type Error = core::convert::Infallible;
///
///     fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
///         for (offset, byte) in buf.iter_mut().enumerate() {
///             self.wait_ready();
///             *byte = self.read_byte(address + offset as u16);
///         }
///         Ok(())
///     }
///
///     fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error> {
///         for (offset, byte) in data.iter().enumerate() {
///             self.wait_ready();
///             self.write_byte(address + offset as u16, *byte);
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait NvMemory {
    /// Error reported by the medium
    type Error;

    /// Read `buf.len()` bytes starting at `address`
    ///
    /// # Errors
    ///
    /// Returns an error if the medium fails to read.
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` starting at `address`
    ///
    /// # Errors
    ///
    /// Returns an error if the medium reports a failed write.
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error>;

    /// Read one little-endian word
    ///
    /// # Errors
    ///
    /// Returns an error if the medium fails to read.
    fn read_word(&mut self, address: u16) -> Result<u16, Self::Error> {
        let mut bytes = [0u8; 2];
        self.read(address, &mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Write one little-endian word
    ///
    /// # Errors
    ///
    /// Returns an error if the medium reports a failed write.
    fn write_word(&mut self, address: u16, value: u16) -> Result<(), Self::Error> {
        self.write(address, &value.to_le_bytes())
    }
}

impl<T: NvMemory + ?Sized> NvMemory for &mut T {
    type Error = T::Error;

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read(self, address, buf)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, address, data)
    }
}
