//! Calibration point type and persisted encoding
//!
//! Each slot occupies two 16-bit words:
//!
//! ```text
//!  word 1:  15     14     13 ............ 0
//!          state  sign   |reference value|
//!  word 2:  15     14     13 ............ 0
//!           -     sign   |actual value|
//! ```

use crate::VALUE_LIMIT;

/// Bit 15 of the first word: point is enabled
const STATE_BIT: u16 = 1 << 15;

/// Bit 14 of either word: value is negative
const SIGN_BIT: u16 = 1 << 14;

/// Low 14 bits of either word: magnitude
const MAGNITUDE_MASK: u16 = SIGN_BIT - 1;

/// One operator-defined calibration point
///
/// `act_value` is what the sensor read while immersed in a reference
/// solution, `ref_value` is what it should have read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationPoint {
    /// Point takes part in the correction function
    pub state: bool,
    /// Reference (true) value
    pub ref_value: i16,
    /// Actual (measured) value
    pub act_value: i16,
}

impl CalibrationPoint {
    /// Disabled point, also the decoded form of an erased slot
    pub const DISABLED: Self = Self::new(false, 0, 0);

    /// Create a calibration point
    #[must_use]
    pub const fn new(state: bool, ref_value: i16, act_value: i16) -> Self {
        Self {
            state,
            ref_value,
            act_value,
        }
    }

    /// Create an enabled calibration point
    #[must_use]
    pub const fn enabled(ref_value: i16, act_value: i16) -> Self {
        Self::new(true, ref_value, act_value)
    }

    /// Both values lie within `[-VALUE_LIMIT, VALUE_LIMIT]`
    #[must_use]
    pub const fn is_in_range(&self) -> bool {
        self.ref_value >= -VALUE_LIMIT
            && self.ref_value <= VALUE_LIMIT
            && self.act_value >= -VALUE_LIMIT
            && self.act_value <= VALUE_LIMIT
    }

    /// Point may contribute to the correction function
    ///
    /// Only enabled points with strictly positive reference and actual values
    /// are considered.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.state && self.ref_value > 0 && self.act_value > 0
    }

    /// Encode into the two persisted words
    ///
    /// The point must be in range; magnitudes above 14 bits would spill into
    /// the flag bits.
    #[must_use]
    pub const fn encode(&self) -> [u16; 2] {
        let mut word1 = encode_value(self.ref_value);
        if self.state {
            word1 |= STATE_BIT;
        }
        [word1, encode_value(self.act_value)]
    }

    /// Encode into the 4-byte little-endian slot image
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 4] {
        let [word1, word2] = self.encode();
        let [b0, b1] = word1.to_le_bytes();
        let [b2, b3] = word2.to_le_bytes();
        [b0, b1, b2, b3]
    }

    /// Decode the two persisted words
    ///
    /// Bit 15 of the second word carries no meaning and is ignored. Erased
    /// memory must be recognised by the caller before decoding, see
    /// [`ERASED_WORD`](crate::ERASED_WORD).
    #[must_use]
    pub const fn decode(word1: u16, word2: u16) -> Self {
        Self {
            state: word1 & STATE_BIT != 0,
            ref_value: decode_value(word1),
            act_value: decode_value(word2),
        }
    }
}

const fn encode_value(value: i16) -> u16 {
    let magnitude = value.unsigned_abs() & MAGNITUDE_MASK;
    if value < 0 {
        magnitude | SIGN_BIT
    } else {
        magnitude
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn decode_value(word: u16) -> i16 {
    // 14-bit magnitude always fits in i16
    let magnitude = (word & MAGNITUDE_MASK) as i16;
    if word & SIGN_BIT != 0 {
        -magnitude
    } else {
        magnitude
    }
}
