//! Calibration slots persisted in non-volatile memory
//!
//! The store owns the memory holding the slots and the engine derived from
//! them. Every accepted write updates the memory, the in-memory slot and the
//! engine together, so the correction in use always matches what is stored.

use heapless::Vec;

use super::{CalibrationEngine, CalibrationPoint};
use crate::storage::NvMemory;
use crate::{ERASED_WORD, SLOT_SIZE};

/// Result of a calibration point update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteOutcome {
    /// Point was persisted and the correction rebuilt
    Updated,
    /// Point equals the stored one; nothing was written
    Unchanged,
    /// Slot index or a value was out of range; nothing was written
    Rejected,
}

impl WriteOutcome {
    /// Point was persisted
    #[must_use]
    pub const fn is_updated(self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// Calibration slots backed by non-volatile memory
///
/// Slot `p` lives at `base_address + p * 4`. `N` is the slot capacity; the
/// number of slots in use is fixed when the store is loaded.
pub struct CalibrationStore<M, const N: usize> {
    memory: M,
    base_address: u16,
    slots: Vec<CalibrationPoint, N>,
    engine: CalibrationEngine<N>,
}

impl<M, const N: usize> CalibrationStore<M, N>
where
    M: NvMemory,
{
    /// Load `point_count` slots starting at `base_address` and build the engine
    ///
    /// Slots are read one after another. A slot whose first word is erased
    /// decodes as [`CalibrationPoint::DISABLED`] and moves the read position
    /// forward by 2 bytes only, so the next slot is read starting at the
    /// erased slot's second word. Images written by earlier firmware rely on
    /// this layout.
    ///
    /// Stored magnitudes are taken as they are. A foreign image may hold
    /// values beyond [`VALUE_LIMIT`](crate::VALUE_LIMIT); such points are
    /// loaded and, when eligible, used by the correction. Only
    /// [`write`](Self::write) enforces the limit.
    ///
    /// `point_count` is clamped to the capacity `N`: at most `N` slots are
    /// read and [`point_count`](Self::point_count) reports the clamped value.
    /// `OrpSensor::new` rejects such a configuration before loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory fails to read.
    pub fn load(mut memory: M, base_address: u16, point_count: u8) -> Result<Self, M::Error> {
        let count = usize::from(point_count).min(N);
        let mut slots = Vec::new();
        let mut position = base_address;
        #[cfg(feature = "defmt")]
        let mut erased = 0u8;

        for _ in 0..count {
            let word1 = memory.read_word(position)?;
            let point = if word1 == ERASED_WORD {
                #[cfg(feature = "defmt")]
                {
                    erased += 1;
                }
                position = position.wrapping_add(2);
                CalibrationPoint::DISABLED
            } else {
                let word2 = memory.read_word(position.wrapping_add(2))?;
                position = position.wrapping_add(SLOT_SIZE);
                CalibrationPoint::decode(word1, word2)
            };
            // `count` never exceeds the capacity
            let _ = slots.push(point);
        }

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Loaded {} calibration slots at 0x{:04X} ({} erased)",
            count,
            base_address,
            erased
        );

        let engine = CalibrationEngine::from_slots(&slots);
        Ok(Self {
            memory,
            base_address,
            slots,
            engine,
        })
    }

    /// Store a calibration point in slot `index`
    ///
    /// Out-of-range input is rejected and an identical point is not
    /// rewritten. Otherwise both words are written, the slot is updated and
    /// the engine rebuilt.
    ///
    /// If the memory fails partway, the in-memory slot keeps its previous
    /// value and the error is returned; the medium may then hold a partly
    /// written slot until the next successful write.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory reports a failed write.
    pub fn write(
        &mut self,
        index: u8,
        point: CalibrationPoint,
    ) -> Result<WriteOutcome, M::Error> {
        let slot = usize::from(index);
        let Some(&stored) = self.slots.get(slot) else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Calibration slot {} out of range (count {})",
                index,
                self.slots.len()
            );
            return Ok(WriteOutcome::Rejected);
        };

        if !point.is_in_range() {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Calibration values out of range: ref={} act={}",
                point.ref_value,
                point.act_value
            );
            return Ok(WriteOutcome::Rejected);
        }

        if stored == point {
            #[cfg(feature = "defmt")]
            defmt::trace!("Calibration slot {} unchanged", index);
            return Ok(WriteOutcome::Unchanged);
        }

        let [word1, word2] = point.encode();
        let address = self.slot_address(index);
        self.memory.write_word(address, word1)?;
        self.memory.write_word(address.wrapping_add(2), word2)?;

        self.slots[slot] = point;
        self.engine.rebuild(&self.slots);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Calibration slot {} updated: state={} ref={} act={}",
            index,
            point.state,
            point.ref_value,
            point.act_value
        );

        Ok(WriteOutcome::Updated)
    }
}

impl<M, const N: usize> CalibrationStore<M, N> {
    /// Calibration point in slot `index`, or a disabled point if out of range
    #[must_use]
    pub fn point(&self, index: u8) -> CalibrationPoint {
        self.slots
            .get(usize::from(index))
            .copied()
            .unwrap_or(CalibrationPoint::DISABLED)
    }

    /// All slots in index order
    #[must_use]
    pub fn slots(&self) -> &[CalibrationPoint] {
        &self.slots
    }

    /// Number of slots
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn point_count(&self) -> u8 {
        // Loaded from a u8 count
        self.slots.len() as u8
    }

    /// First byte of the slot image
    #[must_use]
    pub const fn base_address(&self) -> u16 {
        self.base_address
    }

    /// Correction derived from the current slots
    #[must_use]
    pub const fn engine(&self) -> &CalibrationEngine<N> {
        &self.engine
    }

    /// Correct a raw reading with the current calibration
    #[must_use]
    pub fn evaluate(&self, raw: i32) -> i32 {
        self.engine.evaluate(raw)
    }

    /// Consume the store and return the memory
    pub fn release(self) -> M {
        self.memory
    }

    fn slot_address(&self, index: u8) -> u16 {
        self.base_address
            .wrapping_add(u16::from(index).wrapping_mul(SLOT_SIZE))
    }
}
