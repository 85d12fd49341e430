//! Sequence transforms: transposition, trimming, format conversion

use crate::error::{PolyError, Result};
use crate::midi::{MidiEvent, MidiMessage, Sequence, Track, DRUM_CHANNEL, NOTE_OFF, NOTE_ON, POLY_PRESSURE};

/// How channel nibbles are rewritten during a format-0 merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMapping {
    /// Keep each event's original channel
    Keep,
    /// Rewrite each event's channel to its source track index, for track
    /// indexes that are legal MIDI channels (0..=15)
    TrackIndex,
}

/// Shift every keyed channel event by `steps` semitones, wrapping mod 128.
///
/// The percussion channel is skipped unless `include_drums` is set, since
/// its data bytes select instruments rather than pitches.
pub fn transpose(sequence: &mut Sequence, steps: i32, include_drums: bool) {
    for track in &mut sequence.tracks {
        for event in track.events_mut() {
            let MidiMessage::Short { status, data1, .. } = &mut event.message else {
                continue;
            };
            if !matches!(*status & 0xF0, NOTE_ON | NOTE_OFF | POLY_PRESSURE) {
                continue;
            }
            if *status & 0x0F == DRUM_CHANNEL && !include_drums {
                continue;
            }
            *data1 = (*data1 as i32 + steps).rem_euclid(128) as u8;
        }
    }
}

/// Copy of the sequence retaining only events before `total_ticks`.
///
/// Every resulting track ends with an End-of-Track, synthesized at the last
/// retained tick when the original marker fell past the cut.
pub fn trim(sequence: &Sequence, total_ticks: u64) -> Sequence {
    let mut out = Sequence::new(
        sequence.division_type,
        sequence.resolution,
        sequence.file_type,
    );
    for track in &sequence.tracks {
        let mut trimmed = Track::new();
        for event in track.events() {
            if event.tick < total_ticks {
                trimmed.add(event.clone());
            }
        }
        trimmed.ensure_end_of_track();
        out.tracks.push(trimmed);
    }
    out
}

/// Convert a sequence to the given file type.
///
/// Converting to the current type, to a non-zero type, or from a
/// single-track sequence deep-copies with the new type tag. Converting a
/// multi-track sequence to format 0 merges all tracks into one, dropping
/// per-track End-of-Track markers and appending a single terminal one.
pub fn convert(
    sequence: &Sequence,
    file_type: u16,
    mapping: ChannelMapping,
) -> Result<Sequence> {
    if file_type > 2 {
        return Err(PolyError::UnsupportedOperation(format!(
            "unknown target file type {}",
            file_type
        )));
    }

    if file_type == sequence.file_type || file_type != 0 || sequence.tracks.len() <= 1 {
        let mut copy = sequence.clone();
        copy.file_type = file_type;
        return Ok(copy);
    }

    let mut collected: Vec<MidiEvent> = Vec::new();
    for (track_index, track) in sequence.tracks.iter().enumerate() {
        for event in track.events() {
            if event.message.is_end_of_track() {
                continue;
            }
            let mut event = event.clone();
            if mapping == ChannelMapping::TrackIndex && track_index <= 0x0F {
                if let MidiMessage::Short { status, .. } = &mut event.message {
                    if (0x80..0xF0).contains(status) {
                        *status = (*status & 0xF0) | track_index as u8;
                    }
                }
            }
            collected.push(event);
        }
    }
    // Stable by tick: ties keep track order, then intra-track order
    collected.sort_by_key(|event| event.tick);

    let mut merged = Track::new();
    for event in collected {
        merged.add(event);
    }
    merged.ensure_end_of_track();

    let mut out = Sequence::new(sequence.division_type, sequence.resolution, 0);
    out.tracks.push(merged);
    Ok(out)
}
