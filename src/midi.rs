//! MIDI sequence data model: sequences, tracks, events, messages

use crate::error::{PolyError, Result};

/// Zero-indexed General MIDI percussion channel
pub const DRUM_CHANNEL: u8 = 9;

// Channel message commands (high status nibble)
pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const POLY_PRESSURE: u8 = 0xA0;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const CHANNEL_PRESSURE: u8 = 0xD0;
pub const PITCH_BEND: u8 = 0xE0;

// System and meta status bytes
pub const SYSEX_START: u8 = 0xF0;
pub const SONG_POSITION: u8 = 0xF2;
pub const SONG_SELECT: u8 = 0xF3;
pub const BUS_SELECT: u8 = 0xF5;
pub const SYSEX_END: u8 = 0xF7;
pub const META: u8 = 0xFF;

// Meta event types
pub const META_TRACK_NAME: u8 = 0x03;
pub const META_END_OF_TRACK: u8 = 0x2F;
pub const META_TEMPO: u8 = 0x51;
pub const META_TIME_SIGNATURE: u8 = 0x58;

/// Timing base of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionType {
    /// Pulses per quarter note; wall-clock length depends on tempo
    Ppq,
    Smpte24,
    Smpte25,
    Smpte30Drop,
    Smpte30,
}

impl DivisionType {
    /// SMPTE frames per second, `None` for PPQ
    pub fn frames_per_second(&self) -> Option<f64> {
        match self {
            DivisionType::Ppq => None,
            DivisionType::Smpte24 => Some(24.0),
            DivisionType::Smpte25 => Some(25.0),
            DivisionType::Smpte30Drop => Some(29.97),
            DivisionType::Smpte30 => Some(30.0),
        }
    }
}

/// A MIDI message, discriminated by its framing on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Channel or system message with up to two data bytes
    Short { status: u8, data1: u8, data2: u8 },
    /// Meta event (0xFF type payload)
    Meta { kind: u8, data: Vec<u8> },
    /// System-exclusive payload, status 0xF0 or 0xF7
    Sysex { status: u8, data: Vec<u8> },
}

impl MidiMessage {
    pub fn short(status: u8, data1: u8, data2: u8) -> Self {
        MidiMessage::Short {
            status,
            data1,
            data2,
        }
    }

    pub fn meta(kind: u8, data: Vec<u8>) -> Self {
        MidiMessage::Meta { kind, data }
    }

    pub fn sysex(status: u8, data: Vec<u8>) -> Self {
        MidiMessage::Sysex { status, data }
    }

    pub fn end_of_track() -> Self {
        MidiMessage::Meta {
            kind: META_END_OF_TRACK,
            data: Vec::new(),
        }
    }

    /// Status byte as it appears on the wire
    pub fn status(&self) -> u8 {
        match self {
            MidiMessage::Short { status, .. } => *status,
            MidiMessage::Meta { .. } => META,
            MidiMessage::Sysex { status, .. } => *status,
        }
    }

    /// Message length in bytes, excluding delta time and length prefixes
    pub fn length(&self) -> usize {
        match self {
            MidiMessage::Short { status, .. } => 1 + short_data_len(*status),
            MidiMessage::Meta { data, .. } => 2 + data.len(),
            MidiMessage::Sysex { data, .. } => 1 + data.len(),
        }
    }

    /// Channel 0..=15 for channel messages, `None` otherwise
    pub fn channel(&self) -> Option<u8> {
        match self {
            MidiMessage::Short { status, .. } if (0x80..0xF0).contains(status) => {
                Some(status & 0x0F)
            }
            _ => None,
        }
    }

    /// Command nibble for channel messages, `None` otherwise
    pub fn command(&self) -> Option<u8> {
        match self {
            MidiMessage::Short { status, .. } if (0x80..0xF0).contains(status) => {
                Some(status & 0xF0)
            }
            _ => None,
        }
    }

    pub fn is_end_of_track(&self) -> bool {
        matches!(
            self,
            MidiMessage::Meta {
                kind: META_END_OF_TRACK,
                ..
            }
        )
    }
}

/// Number of data bytes following a short-message status byte
pub fn short_data_len(status: u8) -> usize {
    match status & 0xF0 {
        0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => 2,
        0xC0 | 0xD0 => 1,
        0xF0 => match status {
            SONG_POSITION => 2,
            SONG_SELECT | BUS_SELECT => 1,
            _ => 0,
        },
        _ => 0,
    }
}

/// A timestamped message within a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    pub tick: u64,
    pub message: MidiMessage,
}

impl MidiEvent {
    pub fn new(tick: u64, message: MidiMessage) -> Self {
        Self { tick, message }
    }
}

/// An ordered sequence of events, sorted by tick with stable tie order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    events: Vec<MidiEvent>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert preserving tick order; an event ties after existing events
    /// at the same tick.
    pub fn add(&mut self, event: MidiEvent) {
        let index = self
            .events
            .iter()
            .rposition(|existing| existing.tick <= event.tick)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.events.insert(index, event);
    }

    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> impl Iterator<Item = &mut MidiEvent> {
        self.events.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MidiEvent> {
        self.events.get(index)
    }

    /// Tick of the last event, 0 for an empty track
    pub fn ticks(&self) -> u64 {
        self.events.last().map(|event| event.tick).unwrap_or(0)
    }

    pub fn has_end_of_track(&self) -> bool {
        self.events
            .iter()
            .any(|event| event.message.is_end_of_track())
    }

    /// Append a terminal End-of-Track at the current last tick if the track
    /// does not already carry one.
    pub fn ensure_end_of_track(&mut self) {
        if !self.has_end_of_track() {
            let tick = self.ticks();
            self.add(MidiEvent::new(tick, MidiMessage::end_of_track()));
        }
    }
}

/// A MIDI sequence: timing base, resolution, file type, and tracks
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub division_type: DivisionType,
    pub resolution: u16,
    pub file_type: u16,
    pub tracks: Vec<Track>,
}

impl Sequence {
    pub fn new(division_type: DivisionType, resolution: u16, file_type: u16) -> Self {
        Self {
            division_type,
            resolution,
            file_type,
            tracks: Vec::new(),
        }
    }

    /// Longest track length in ticks
    pub fn tick_length(&self) -> u64 {
        self.tracks.iter().map(Track::ticks).max().unwrap_or(0)
    }

    /// Sequence duration in microseconds.
    ///
    /// Only defined for SMPTE timing; a PPQ sequence's duration depends on
    /// tempo events and fails with `UnsupportedOperation`.
    pub fn microsecond_length(&self) -> Result<u64> {
        match self.division_type.frames_per_second() {
            Some(fps) => {
                Ok((self.tick_length() as f64 * 1_000_000.0 / (fps * self.resolution as f64)) as u64)
            }
            None => Err(PolyError::UnsupportedOperation(
                "microsecond length of a PPQ sequence depends on tempo".to_string(),
            )),
        }
    }
}
