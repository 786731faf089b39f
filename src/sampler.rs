//! Trimmed-mean filtering of the internal ADC
//!
//! The on-chip converter is noisy and has no hardware filtering in front of
//! it. A burst of readings is taken, the extremes on both ends are dropped,
//! and the rest are averaged before scaling to millivolts.

/// Raw readings taken per filtered sample
pub const SAMPLE_COUNT: usize = 120;

/// Readings discarded at each end of the sorted burst
pub const TRIM_COUNT: usize = 10;

/// Readings averaged after trimming
pub const KEPT_COUNT: usize = SAMPLE_COUNT - 2 * TRIM_COUNT;

/// Trimmed-mean sampler for the internal converter
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrimmedMeanSampler {
    units_per_count: f32,
}

impl TrimmedMeanSampler {
    /// Create a sampler for a converter of `adc_bits` resolution referenced to
    /// `reference_voltage_mv`
    ///
    /// One count is worth `reference_voltage_mv / (2^adc_bits - 1)`. The
    /// resolution is clamped to 1..=16 bits.
    #[must_use]
    pub fn new(reference_voltage_mv: u16, adc_bits: u8) -> Self {
        let full_scale = (1u32 << adc_bits.clamp(1, 16)) - 1;
        // full_scale <= 65535 is exact in f32
        #[allow(clippy::cast_precision_loss)]
        let units_per_count = f32::from(reference_voltage_mv) / full_scale as f32;
        Self { units_per_count }
    }

    /// Millivolts represented by one converter count
    #[must_use]
    pub const fn units_per_count(&self) -> f32 {
        self.units_per_count
    }

    /// Take a full burst with `read` and return the filtered value
    ///
    /// # Errors
    ///
    /// Returns the first error reported by `read`; the burst is abandoned.
    pub fn sample<F, E>(&self, mut read: F) -> Result<i32, E>
    where
        F: FnMut() -> Result<i32, E>,
    {
        let mut samples = [0i32; SAMPLE_COUNT];
        for sample in &mut samples {
            *sample = read()?;
        }
        Ok(self.filter(&mut samples))
    }

    /// Sort the burst, average the central readings and scale
    ///
    /// `samples` is left sorted.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn filter(&self, samples: &mut [i32; SAMPLE_COUNT]) -> i32 {
        samples.sort_unstable();

        let total: i64 = samples[TRIM_COUNT..SAMPLE_COUNT - TRIM_COUNT]
            .iter()
            .map(|&sample| i64::from(sample))
            .sum();

        let mean = total as f32 / KEPT_COUNT as f32;

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "Trimmed mean {} counts (min {}, max {})",
            mean,
            samples[0],
            samples[SAMPLE_COUNT - 1]
        );

        libm::roundf(mean * self.units_per_count) as i32
    }
}
