//! Validation tests for the MIDI sequence model

use poly2midi::error::PolyError;
use poly2midi::midi::{
    DivisionType, MidiEvent, MidiMessage, Sequence, Track, CONTROL_CHANGE, NOTE_ON,
};

/// Shorthand for a NoteOn event
fn note_on(tick: u64, channel: u8, key: u8, velocity: u8) -> MidiEvent {
    MidiEvent::new(tick, MidiMessage::short(NOTE_ON | channel, key, velocity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_add_sorts_by_tick() {
        let mut track = Track::new();
        track.add(note_on(100, 0, 60, 100));
        track.add(note_on(0, 0, 62, 100));
        track.add(note_on(50, 0, 64, 100));

        let ticks: Vec<u64> = track.events().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 50, 100]);
    }

    #[test]
    fn test_track_add_keeps_tie_order() {
        let mut track = Track::new();
        track.add(note_on(10, 0, 60, 100));
        track.add(note_on(10, 0, 61, 100));
        track.add(note_on(10, 0, 62, 100));

        let keys: Vec<u8> = track
            .events()
            .iter()
            .map(|e| match e.message {
                MidiMessage::Short { data1, .. } => data1,
                _ => panic!("unexpected message"),
            })
            .collect();
        assert_eq!(keys, vec![60, 61, 62], "equal ticks keep insertion order");
    }

    #[test]
    fn test_track_ticks() {
        let mut track = Track::new();
        assert_eq!(track.ticks(), 0);
        track.add(note_on(480, 0, 60, 100));
        assert_eq!(track.ticks(), 480);
    }

    #[test]
    fn test_ensure_end_of_track() {
        let mut track = Track::new();
        track.add(note_on(480, 0, 60, 100));
        assert!(!track.has_end_of_track());

        track.ensure_end_of_track();
        assert!(track.has_end_of_track());
        assert_eq!(track.events().last().unwrap().tick, 480);

        let len = track.len();
        track.ensure_end_of_track();
        assert_eq!(track.len(), len, "must not add a second marker");
    }

    #[test]
    fn test_sequence_tick_length() {
        let mut sequence = Sequence::new(DivisionType::Ppq, 480, 1);
        assert_eq!(sequence.tick_length(), 0);

        let mut short = Track::new();
        short.add(note_on(120, 0, 60, 100));
        let mut long = Track::new();
        long.add(note_on(960, 0, 62, 100));
        sequence.tracks.push(short);
        sequence.tracks.push(long);

        assert_eq!(sequence.tick_length(), 960);
    }

    #[test]
    fn test_microsecond_length_smpte() {
        let mut sequence = Sequence::new(DivisionType::Smpte24, 100, 0);
        let mut track = Track::new();
        track.add(note_on(2400, 0, 60, 100));
        track.ensure_end_of_track();
        sequence.tracks.push(track);

        // 2400 ticks at 24 fps x 100 ticks/frame = one second
        assert_eq!(sequence.microsecond_length().unwrap(), 1_000_000);
    }

    #[test]
    fn test_microsecond_length_fails_on_ppq() {
        let sequence = Sequence::new(DivisionType::Ppq, 480, 0);
        match sequence.microsecond_length() {
            Err(PolyError::UnsupportedOperation(_)) => {}
            other => panic!("expected UnsupportedOperation, got {:?}", other),
        }
    }

    #[test]
    fn test_message_accessors() {
        let short = MidiMessage::short(NOTE_ON | 3, 60, 100);
        assert_eq!(short.status(), 0x93);
        assert_eq!(short.channel(), Some(3));
        assert_eq!(short.command(), Some(NOTE_ON));
        assert_eq!(short.length(), 3);

        let program = MidiMessage::short(0xC5, 10, 0);
        assert_eq!(program.length(), 2);

        let control = MidiMessage::short(CONTROL_CHANGE, 7, 127);
        assert_eq!(control.command(), Some(CONTROL_CHANGE));

        let meta = MidiMessage::meta(0x51, vec![0x07, 0xA1, 0x20]);
        assert_eq!(meta.status(), 0xFF);
        assert_eq!(meta.channel(), None);
        assert_eq!(meta.length(), 5);

        let sysex = MidiMessage::sysex(0xF0, vec![0x7E, 0x7F]);
        assert_eq!(sysex.status(), 0xF0);
        assert_eq!(sysex.length(), 3);

        assert!(MidiMessage::end_of_track().is_end_of_track());
        assert!(!short.is_end_of_track());
    }
}
