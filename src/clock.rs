//! Bit clock abstraction and WS28xx phase timing.

use crate::types::{ChannelId, LedError};
use crate::{BIT_TIME_NS, DATA_RATE_HZ};

/// Allowed deviation of the bit-time from [`BIT_TIME_NS`].
const BIT_TIME_TOLERANCE_NS: u32 = 150;

/// Window for the data phase, where a 0 bit ends its high pulse (T0H).
const EARLY_PHASE_NS: (u32, u32) = (250, 550);

/// Window for the forced-space phase, where a 1 bit ends its high pulse (T1H).
const LATE_PHASE_NS: (u32, u32) = (650, 950);

/// Default data phase offset.
pub const DEFAULT_EARLY_NS: u32 = 400;

/// Default forced-space phase offset.
pub const DEFAULT_LATE_NS: u32 = 800;

/// Trait for the periodic timer that paces the transfer channels.
///
/// One period equals one protocol bit-time. The timer raises a trigger for
/// each channel at that channel's phase; the board's interrupt or DMA glue
/// forwards those triggers to the strip.
pub trait BitClock {
    /// Applies period and phase offsets.
    fn configure(&mut self, timing: &BitTiming);

    /// Starts counting. Calling this while running has no effect.
    fn start(&mut self);

    /// Stops counting.
    fn stop(&mut self);

    /// Resets the counter to zero.
    fn reset_counter(&mut self);

    /// Clears pending update and compare events.
    fn clear_pending(&mut self);

    /// Enables hardware triggering of `channel`.
    fn enable_trigger(&mut self, channel: ChannelId);

    /// Disables hardware triggering of `channel`.
    fn disable_trigger(&mut self, channel: ChannelId);

    /// Returns true if the clock currently triggers `channel`.
    fn is_trigger_enabled(&self, channel: ChannelId) -> bool;

    /// Returns true if the timer latched an error since the last
    /// [`clear_fault`](Self::clear_fault).
    fn has_fault(&self) -> bool {
        false
    }

    /// Clears the fault latch. Called while arming each transfer.
    fn clear_fault(&mut self) {}
}

/// Period and phase offsets of the bit clock, in timer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    timer_hz: u32,
    period_ticks: u32,
    early_ticks: u32,
    late_ticks: u32,
}

impl BitTiming {
    /// Derives timing from the timer input clock using the default phases.
    pub fn new(timer_hz: u32) -> Result<Self, LedError> {
        Self::with_phases(timer_hz, DEFAULT_EARLY_NS, DEFAULT_LATE_NS)
    }

    /// Derives timing from the timer input clock with explicit phase offsets.
    ///
    /// # Errors
    /// `InvalidTiming` if the resulting bit-time or either phase falls outside
    /// the WS28xx tolerances, or the phases cannot be told apart at this clock.
    pub fn with_phases(timer_hz: u32, early_ns: u32, late_ns: u32) -> Result<Self, LedError> {
        let period_ticks = timer_hz / DATA_RATE_HZ;
        if period_ticks < 3 {
            return Err(LedError::InvalidTiming);
        }

        let early_ticks = ns_to_ticks(timer_hz, early_ns);
        let late_ticks = ns_to_ticks(timer_hz, late_ns);

        let timing = Self {
            timer_hz,
            period_ticks,
            early_ticks,
            late_ticks,
        };

        let period_ns = timing.period_ns();
        if period_ns.abs_diff(BIT_TIME_NS) > BIT_TIME_TOLERANCE_NS {
            return Err(LedError::InvalidTiming);
        }
        if !in_window(timing.early_ns(), EARLY_PHASE_NS) || !in_window(timing.late_ns(), LATE_PHASE_NS) {
            return Err(LedError::InvalidTiming);
        }
        if early_ticks == 0 || early_ticks >= late_ticks || late_ticks >= period_ticks {
            return Err(LedError::InvalidTiming);
        }

        Ok(timing)
    }

    /// Timer input clock in Hz.
    #[inline]
    pub fn timer_hz(&self) -> u32 {
        self.timer_hz
    }

    /// Auto-reload value: ticks per bit.
    #[inline]
    pub fn period_ticks(&self) -> u32 {
        self.period_ticks
    }

    /// Compare value for the data channel.
    #[inline]
    pub fn early_ticks(&self) -> u32 {
        self.early_ticks
    }

    /// Compare value for the forced-space channel.
    #[inline]
    pub fn late_ticks(&self) -> u32 {
        self.late_ticks
    }

    /// Compare value for `channel`; the mark channel fires on update (tick 0).
    pub fn phase_ticks(&self, channel: ChannelId) -> u32 {
        match channel {
            ChannelId::Mark => 0,
            ChannelId::Data => self.early_ticks,
            ChannelId::ForcedSpace => self.late_ticks,
        }
    }

    /// Actual bit-time in nanoseconds.
    #[inline]
    pub fn period_ns(&self) -> u32 {
        ticks_to_ns(self.timer_hz, self.period_ticks)
    }

    /// High time of a 0 bit in nanoseconds.
    #[inline]
    pub fn early_ns(&self) -> u32 {
        ticks_to_ns(self.timer_hz, self.early_ticks)
    }

    /// High time of a 1 bit in nanoseconds.
    #[inline]
    pub fn late_ns(&self) -> u32 {
        ticks_to_ns(self.timer_hz, self.late_ticks)
    }

    /// Time to clock out `words` waveform words, rounded up to microseconds.
    pub fn transfer_duration_us(&self, words: usize) -> u32 {
        let total_ns = u64::from(self.period_ns()).saturating_mul(words as u64);
        let us = total_ns.div_ceil(1_000);
        u32::try_from(us).unwrap_or(u32::MAX)
    }
}

fn ns_to_ticks(timer_hz: u32, ns: u32) -> u32 {
    let ticks = (u64::from(timer_hz) * u64::from(ns) + 500_000_000) / 1_000_000_000;
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

fn ticks_to_ns(timer_hz: u32, ticks: u32) -> u32 {
    if timer_hz == 0 {
        return u32::MAX;
    }
    let ns = u64::from(ticks) * 1_000_000_000 / u64::from(timer_hz);
    u32::try_from(ns).unwrap_or(u32::MAX)
}

fn in_window(value: u32, (low, high): (u32, u32)) -> bool {
    value >= low && value <= high
}
