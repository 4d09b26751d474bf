//! Shared test infrastructure for ws28xx-dma integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use heapless::Vec;
use ws28xx_dma::{BitClock, BitTiming, ChannelId, LedStrip, SharedLedStrip, TransferOutcome};

/// Timer clock of the reference board (STM32F4 advanced timer).
pub const TIMER_HZ: u32 = 168_000_000;

pub fn timing() -> BitTiming {
    BitTiming::new(TIMER_HZ).unwrap()
}

// ============================================================================
// Mock Pin
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

#[derive(Debug)]
pub struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Mock data pin that tracks the line level
pub struct MockPin {
    level: Level,
    writes: usize,
    fail_after: Option<usize>,
}

impl MockPin {
    /// Starts high so tests can tell that the driver pulled it low.
    pub fn new() -> Self {
        Self {
            level: Level::High,
            writes: 0,
            fail_after: None,
        }
    }

    /// Pin whose writes fail once `writes` successful writes have been made
    pub fn failing_after(writes: usize) -> Self {
        Self {
            fail_after: Some(writes),
            ..Self::new()
        }
    }

    fn write(&mut self, level: Level) -> Result<(), MockPinError> {
        if self.fail_after.is_some_and(|limit| self.writes >= limit) {
            return Err(MockPinError);
        }
        self.writes += 1;
        self.level = level;
        Ok(())
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(Level::High)
    }
}

// ============================================================================
// Mock Clock
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOp {
    Configure,
    Start,
    Stop,
    ResetCounter,
    ClearPending,
    EnableTrigger(ChannelId),
    DisableTrigger(ChannelId),
}

/// Mock bit clock recording every register operation
pub struct MockClock {
    running: bool,
    triggers: [bool; 3],
    timing: Option<BitTiming>,
    fault: bool,
    faulty_transfers: usize,
    ops: Vec<ClockOp, 64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            running: false,
            triggers: [false; 3],
            timing: None,
            fault: false,
            faulty_transfers: 0,
            ops: Vec::new(),
        }
    }

    /// Clock that latches a fault during each of its next `transfers` transfers
    pub fn faulty(transfers: usize) -> Self {
        Self {
            faulty_transfers: transfers,
            ..Self::new()
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn timing(&self) -> Option<BitTiming> {
        self.timing
    }

    pub fn any_trigger_enabled(&self) -> bool {
        self.triggers.iter().any(|enabled| *enabled)
    }

    pub fn ops(&self) -> &[ClockOp] {
        &self.ops
    }

    fn record(&mut self, op: ClockOp) {
        if self.ops.is_full() {
            self.ops.clear();
        }
        let _ = self.ops.push(op);
    }
}

impl BitClock for MockClock {
    fn configure(&mut self, timing: &BitTiming) {
        self.timing = Some(*timing);
        self.record(ClockOp::Configure);
    }

    fn start(&mut self) {
        self.running = true;
        if self.any_trigger_enabled() && self.faulty_transfers > 0 {
            self.faulty_transfers -= 1;
            self.fault = true;
        }
        self.record(ClockOp::Start);
    }

    fn stop(&mut self) {
        self.running = false;
        self.record(ClockOp::Stop);
    }

    fn reset_counter(&mut self) {
        self.record(ClockOp::ResetCounter);
    }

    fn clear_pending(&mut self) {
        self.record(ClockOp::ClearPending);
    }

    fn enable_trigger(&mut self, channel: ChannelId) {
        self.triggers[channel.index()] = true;
        self.record(ClockOp::EnableTrigger(channel));
    }

    fn disable_trigger(&mut self, channel: ChannelId) {
        self.triggers[channel.index()] = false;
        self.record(ClockOp::DisableTrigger(channel));
    }

    fn is_trigger_enabled(&self, channel: ChannelId) -> bool {
        self.running && self.triggers[channel.index()]
    }

    fn has_fault(&self) -> bool {
        self.fault
    }

    fn clear_fault(&mut self) {
        self.fault = false;
    }
}

// ============================================================================
// Strip helpers
// ============================================================================

pub type TestStrip<const N: usize> = LedStrip<N, MockPin, MockClock>;

/// Creates an initialized strip
pub fn strip<const N: usize>() -> TestStrip<N> {
    let mut strip = LedStrip::new(MockPin::new(), MockClock::new());
    strip.init(&timing()).unwrap();
    strip
}

/// Line level sampled after each of the three phases of one period
pub type PeriodSample = [Level; 3];

/// Line trace of a whole transfer
pub type LineTrace = Vec<PeriodSample, 1024>;

/// Fires the mark, data and forced-space phases of one clock period and
/// samples the line after each.
pub fn run_period<const N: usize>(strip: &mut TestStrip<N>) -> (PeriodSample, Option<TransferOutcome>) {
    let mut sample = [Level::Low; 3];
    let mut outcome = None;
    for channel in ChannelId::ALL {
        if let Some(result) = strip.on_trigger(channel) {
            outcome = Some(result);
        }
        sample[channel.index()] = strip.pin().level();
    }
    (sample, outcome)
}

/// Clocks the strip until the completion handler reports, or `max_periods`.
pub fn run_transfer<const N: usize>(
    strip: &mut TestStrip<N>,
    max_periods: usize,
) -> (LineTrace, Option<TransferOutcome>) {
    let mut trace = LineTrace::new();
    for _ in 0..max_periods {
        let (sample, outcome) = run_period(strip);
        let _ = trace.push(sample);
        if outcome.is_some() {
            return (trace, outcome);
        }
    }
    (trace, None)
}

/// Reads bit values back from a line trace: a bit is 1 if the line was still
/// high after the data phase.
pub fn line_bits(trace: &[PeriodSample]) -> Vec<bool, 1024> {
    trace
        .iter()
        .map(|sample| sample[ChannelId::Data.index()] == Level::High)
        .collect()
}

/// Packs 24 line bits (G, R, B, MSB first) into (red, green, blue).
pub fn bits_to_rgb(bits: &[bool]) -> (u8, u8, u8) {
    let mut bytes = [0u8; 3];
    for (byte, chunk) in bytes.iter_mut().zip(bits.chunks(8)) {
        for bit in chunk {
            *byte = (*byte << 1) | u8::from(*bit);
        }
    }
    (bytes[1], bytes[0], bytes[2])
}

// ============================================================================
// Shared strip helpers
// ============================================================================

pub type TestShared<const N: usize> = SharedLedStrip<N, MockPin, MockClock>;

pub fn shared<const N: usize>() -> TestShared<N> {
    let shared = SharedLedStrip::new(LedStrip::new(MockPin::new(), MockClock::new()));
    shared.init(&timing()).unwrap();
    shared
}

/// Fires all three phases of one period on a shared strip.
pub fn pump_shared<const N: usize>(shared: &TestShared<N>) -> Option<TransferOutcome> {
    let mut outcome = None;
    for channel in ChannelId::ALL {
        if let Some(result) = shared.on_trigger(channel) {
            outcome = Some(result);
        }
    }
    outcome
}

/// Delay that lets the hardware make progress: every call clocks one period.
pub struct ClockingDelay<'a, const N: usize> {
    shared: &'a TestShared<N>,
    pub calls: usize,
}

impl<'a, const N: usize> ClockingDelay<'a, N> {
    pub fn new(shared: &'a TestShared<N>) -> Self {
        Self { shared, calls: 0 }
    }
}

impl<const N: usize> DelayNs for ClockingDelay<'_, N> {
    fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
        pump_shared(self.shared);
    }
}

/// Delay during which the hardware never triggers.
pub struct StalledDelay {
    pub waited_ns: u64,
}

impl DelayNs for StalledDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns += u64::from(ns);
    }
}

/// Pin that never fails, for tests that do not inspect the line.
pub struct NullPin;

impl ErrorType for NullPin {
    type Error = Infallible;
}

impl OutputPin for NullPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
