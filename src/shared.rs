//! Sharing a strip between the foreground task and interrupt handlers.
//!
//! [`SharedLedStrip`] keeps the [`LedStrip`] behind a critical-section mutex
//! and publishes each transfer's outcome through a one-shot [`Signal`], so
//! callers wait for the actual end of a transfer instead of sleeping for a
//! guessed duration.

use crate::clock::{BitClock, BitTiming};
use crate::strip::LedStrip;
use crate::types::{ChannelId, LedError, TransferOutcome};
use crate::SETTLE_DELAY_MS;
use core::cell::RefCell;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Poll period used by the blocking helpers.
pub const POLL_INTERVAL_US: u32 = 10;

/// A [`LedStrip`] shared between tasks and interrupt handlers.
///
/// Typically placed in a `static` (for example through `static_cell`). The
/// timer/DMA interrupt calls [`on_trigger`](Self::on_trigger); tasks call the
/// remaining methods.
pub struct SharedLedStrip<const N: usize, P: OutputPin, C: BitClock> {
    strip: Mutex<CriticalSectionRawMutex, RefCell<LedStrip<N, P, C>>>,
    done: Signal<CriticalSectionRawMutex, TransferOutcome>,
}

impl<const N: usize, P: OutputPin, C: BitClock> SharedLedStrip<N, P, C> {
    /// Wraps `strip`.
    pub const fn new(strip: LedStrip<N, P, C>) -> Self {
        Self {
            strip: Mutex::new(RefCell::new(strip)),
            done: Signal::new(),
        }
    }

    /// Runs `f` with exclusive access to the strip inside a critical section.
    ///
    /// # Panics
    /// If called again from within `f`.
    pub fn lock<R>(&self, f: impl FnOnce(&mut LedStrip<N, P, C>) -> R) -> R {
        self.strip.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// See [`LedStrip::init`].
    pub fn init(&self, timing: &BitTiming) -> Result<(), LedError> {
        self.lock(|strip| strip.init(timing))
    }

    /// See [`LedStrip::set_pixel`].
    pub fn set_pixel(&self, index: usize, red: u8, green: u8, blue: u8) -> Result<(), LedError> {
        self.lock(|strip| strip.set_pixel(index, red, green, blue))
    }

    /// See [`LedStrip::fill`].
    pub fn fill(&self, red: u8, green: u8, blue: u8) -> Result<(), LedError> {
        self.lock(|strip| strip.fill(red, green, blue))
    }

    /// Starts a full-length transfer. Its outcome is delivered to
    /// [`wait_complete`](Self::wait_complete).
    pub fn transmit(&self) -> Result<(), LedError> {
        self.lock(|strip| self.arm(strip))
    }

    /// Returns true while a transfer is in flight.
    pub fn is_active(&self) -> bool {
        self.lock(|strip| strip.is_active())
    }

    /// Interrupt entry for a clock trigger on `channel`.
    pub fn on_trigger(&self, channel: ChannelId) -> Option<TransferOutcome> {
        let outcome = self.lock(|strip| strip.on_trigger(channel));
        if let Some(outcome) = outcome {
            self.done.signal(outcome);
        }
        outcome
    }

    /// Interrupt entry for a transfer error on `channel`.
    pub fn on_channel_error(&self, channel: ChannelId) -> Option<TransferOutcome> {
        let outcome = self.lock(|strip| strip.on_channel_error(channel));
        if let Some(outcome) = outcome {
            self.done.signal(outcome);
        }
        outcome
    }

    /// Cancels the transfer in flight. Waiters receive `Err(Aborted)`.
    pub fn abort(&self) -> bool {
        let aborted = self.lock(|strip| strip.abort());
        if aborted {
            self.done.signal(Err(LedError::Aborted));
        }
        aborted
    }

    /// Waits for the outcome of the most recent [`transmit`](Self::transmit).
    ///
    /// Each outcome is delivered to one waiter only.
    pub async fn wait_complete(&self) -> TransferOutcome {
        self.done.wait().await
    }

    /// Sets every LED to one colour, transmits and waits for completion.
    pub async fn turn_on_led(&self, red: u8, green: u8, blue: u8) -> TransferOutcome {
        self.start_frame(red, green, blue)?;
        self.wait_complete().await
    }

    /// Turns every LED off and waits for completion.
    pub async fn turn_off_led(&self) -> TransferOutcome {
        self.turn_on_led(0, 0, 0).await
    }

    /// Blocking variant of [`turn_on_led`](Self::turn_on_led).
    ///
    /// Polls for completion with `delay` for at most the transfer duration
    /// plus [`SETTLE_DELAY_MS`]; on expiry the transfer is aborted and
    /// `Timeout` returned.
    pub fn turn_on_led_blocking<D: DelayNs>(
        &self,
        red: u8,
        green: u8,
        blue: u8,
        delay: &mut D,
    ) -> TransferOutcome {
        let budget_us = self.start_frame(red, green, blue)?;
        let timeout_us = budget_us.saturating_add(SETTLE_DELAY_MS * 1_000);

        let mut waited_us = 0u32;
        loop {
            if let Some(outcome) = self.done.try_take() {
                return outcome;
            }
            if waited_us >= timeout_us {
                break;
            }
            delay.delay_us(POLL_INTERVAL_US);
            waited_us = waited_us.saturating_add(POLL_INTERVAL_US);
        }

        if self.abort() {
            self.done.reset();
        } else if let Some(outcome) = self.done.try_take() {
            // Finished between the last poll and the abort.
            return outcome;
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("ws28xx: transfer timed out after {} us", waited_us);

        Err(LedError::Timeout)
    }

    /// Blocking variant of [`turn_off_led`](Self::turn_off_led).
    pub fn turn_off_led_blocking<D: DelayNs>(&self, delay: &mut D) -> TransferOutcome {
        self.turn_on_led_blocking(0, 0, 0, delay)
    }

    /// Encodes a solid colour and arms a transfer. Returns the expected
    /// transfer duration in microseconds.
    ///
    /// The strip is left untouched unless it is initialized and idle.
    fn start_frame(&self, red: u8, green: u8, blue: u8) -> Result<u32, LedError> {
        self.lock(|strip| {
            let budget_us = strip.max_transfer_us().ok_or(LedError::NotInitialized)?;
            if strip.is_active() {
                return Err(LedError::TransferAlreadyActive);
            }
            strip.fill(red, green, blue)?;
            self.arm(strip)?;
            Ok(budget_us)
        })
    }

    /// Clears any stale outcome, then arms. Runs inside the critical section
    /// so the outcome cannot be signalled before the reset.
    fn arm(&self, strip: &mut LedStrip<N, P, C>) -> Result<(), LedError> {
        if strip.is_active() {
            return Err(LedError::TransferAlreadyActive);
        }
        self.done.reset();
        strip.transmit()
    }
}
