//! Transfer channel set: three clock-triggered streams sharing one output pin.
//!
//! Every clock period each channel emits one [`PinCommand`]:
//!
//! | channel | phase | command |
//! |---|---|---|
//! | [`ChannelId::Mark`] | period start | always `High` |
//! | [`ChannelId::Data`] | ~1/3 | `Low` for a 0 bit, `Hold` for a 1 bit |
//! | [`ChannelId::ForcedSpace`] | ~2/3 | always `Low` |
//!
//! A 0 bit therefore produces a short high pulse and a 1 bit a long one, and
//! every period ends low. The mark and forced-space channels replay a
//! length-1 buffer; only their trigger counts follow the transfer length.

use crate::types::ChannelId;
use crate::waveform::{Symbol, WaveformBuffer};

/// Electrical action applied to the output pin at one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinCommand {
    /// Drive the line high.
    High,
    /// Drive the line low.
    Low,
    /// Leave the line unchanged.
    Hold,
}

impl PinCommand {
    /// Command emitted by the data channel for `symbol`.
    #[inline]
    pub const fn for_data_phase(symbol: Symbol) -> Self {
        match symbol {
            Symbol::Mark => PinCommand::Hold,
            Symbol::Space | Symbol::Idle => PinCommand::Low,
        }
    }
}

/// Where a channel reads its words from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelSource {
    /// Length-1 buffer replayed on every trigger.
    Repeat(PinCommand),
    /// The strip's waveform buffer, one word per trigger.
    Waveform,
}

/// Status flags latched by a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelFlags {
    /// All counted triggers consumed.
    pub complete: bool,
    /// Half of the counted triggers consumed.
    pub half: bool,
    /// Transfer error.
    pub error: bool,
}

/// One clock-triggered transfer stream.
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    source: ChannelSource,
    length: u16,
    remaining: u16,
    cursor: u16,
    enabled: bool,
    complete_interrupt: bool,
    flags: ChannelFlags,
}

impl Channel {
    /// Creates a disabled channel with its default source.
    pub const fn new(id: ChannelId) -> Self {
        Self {
            id,
            source: Self::default_source(id),
            length: 0,
            remaining: 0,
            cursor: 0,
            enabled: false,
            complete_interrupt: false,
            flags: ChannelFlags {
                complete: false,
                half: false,
                error: false,
            },
        }
    }

    /// Source each channel is wired to.
    pub const fn default_source(id: ChannelId) -> ChannelSource {
        match id {
            ChannelId::Mark => ChannelSource::Repeat(PinCommand::High),
            ChannelId::Data => ChannelSource::Waveform,
            ChannelId::ForcedSpace => ChannelSource::Repeat(PinCommand::Low),
        }
    }

    /// Channel identity.
    #[inline]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Current source.
    #[inline]
    pub fn source(&self) -> ChannelSource {
        self.source
    }

    /// Triggers left before completion.
    #[inline]
    pub fn remaining(&self) -> u16 {
        self.remaining
    }

    /// Returns true if the channel accepts triggers.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Latched status flags.
    #[inline]
    pub fn flags(&self) -> ChannelFlags {
        self.flags
    }

    /// Returns true if the completion event is routed to the handler.
    #[inline]
    pub fn listens_complete(&self) -> bool {
        self.complete_interrupt
    }

    /// Points the channel at `source`.
    pub(crate) fn set_source(&mut self, source: ChannelSource) {
        self.source = source;
    }

    /// Programs the trigger counter and rewinds the read cursor.
    pub(crate) fn set_counter(&mut self, length: u16) {
        self.length = length;
        self.remaining = length;
        self.cursor = 0;
    }

    pub(crate) fn clear_flags(&mut self) {
        self.flags = ChannelFlags::default();
    }

    pub(crate) fn enable(&mut self) {
        self.enabled = true;
    }

    pub(crate) fn disable(&mut self) {
        self.enabled = false;
    }

    pub(crate) fn listen_complete(&mut self) {
        self.complete_interrupt = true;
    }

    pub(crate) fn raise_error(&mut self) {
        self.flags.error = true;
        self.enabled = false;
    }

    /// Handles one clock trigger and returns the command to apply.
    ///
    /// Disabled or exhausted channels emit nothing. A waveform read past the
    /// end of the buffer latches the error flag and disables the channel.
    pub(crate) fn trigger<const N: usize>(&mut self, waveform: &WaveformBuffer<N>) -> Option<PinCommand> {
        if !self.enabled || self.remaining == 0 {
            return None;
        }

        let command = match self.source {
            ChannelSource::Repeat(command) => command,
            ChannelSource::Waveform => match waveform.get(usize::from(self.cursor)) {
                Some(symbol) => PinCommand::for_data_phase(symbol),
                None => {
                    self.raise_error();
                    return None;
                }
            },
        };

        self.cursor = self.cursor.wrapping_add(1);
        self.remaining -= 1;

        if self.remaining == self.length / 2 {
            self.flags.half = true;
        }
        if self.remaining == 0 {
            self.flags.complete = true;
            self.enabled = false;
        }

        Some(command)
    }
}

/// The three transfer channels driving the LED data line.
#[derive(Debug, Clone)]
pub struct ChannelSet {
    channels: [Channel; 3],
}

impl ChannelSet {
    /// Creates a set of disabled channels on their default sources.
    pub const fn new() -> Self {
        Self {
            channels: [
                Channel::new(ChannelId::Mark),
                Channel::new(ChannelId::Data),
                Channel::new(ChannelId::ForcedSpace),
            ],
        }
    }

    /// Returns the channel with `id`.
    #[inline]
    pub fn get(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    #[inline]
    fn get_mut(&mut self, id: ChannelId) -> &mut Channel {
        &mut self.channels[id.index()]
    }

    /// Latched flags of channel `id`.
    #[inline]
    pub fn flags(&self, id: ChannelId) -> ChannelFlags {
        self.get(id).flags()
    }

    /// Loads sources, clears stale flags and programs every counter to `length`.
    ///
    /// Channels are left disabled.
    pub(crate) fn arm(&mut self, length: u16) {
        self.get_mut(ChannelId::Mark)
            .set_source(ChannelSource::Repeat(PinCommand::High));
        self.get_mut(ChannelId::ForcedSpace)
            .set_source(ChannelSource::Repeat(PinCommand::Low));
        self.get_mut(ChannelId::Data).set_source(ChannelSource::Waveform);

        for channel in &mut self.channels {
            channel.disable();
            channel.clear_flags();
        }
        for channel in &mut self.channels {
            channel.set_counter(length);
        }
    }

    pub(crate) fn enable_all(&mut self) {
        for channel in &mut self.channels {
            channel.enable();
        }
    }

    pub(crate) fn disable_all(&mut self) {
        for channel in &mut self.channels {
            channel.disable();
        }
    }

    /// Routes the completion event of channel `id` to the completion handler.
    pub(crate) fn listen_complete(&mut self, id: ChannelId) {
        self.get_mut(id).listen_complete();
    }

    pub(crate) fn raise_error(&mut self, id: ChannelId) {
        self.get_mut(id).raise_error();
    }

    /// Forwards a clock trigger to channel `id`.
    pub(crate) fn trigger<const N: usize>(
        &mut self,
        id: ChannelId,
        waveform: &WaveformBuffer<N>,
    ) -> Option<PinCommand> {
        self.get_mut(id).trigger(waveform)
    }

    /// Returns true once channel `id` finished and its completion is routed
    /// to the handler.
    pub fn completion_pending(&self, id: ChannelId) -> bool {
        let channel = self.get(id);
        channel.listens_complete() && channel.flags().complete
    }

    /// First channel, in firing order, with a latched error.
    pub fn first_error(&self) -> Option<ChannelId> {
        self.channels
            .iter()
            .find(|channel| channel.flags().error)
            .map(Channel::id)
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}
