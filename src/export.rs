//! MIDI and analysis export from processed state

use crate::audio::AnalysisState;
use crate::config::Config;
use crate::error::{PolyError, Result};
use crate::midi::{
    DivisionType, MidiEvent, MidiMessage, Sequence, Track, META_TEMPO, META_TIME_SIGNATURE,
    NOTE_OFF, NOTE_ON,
};
use crate::smf;
use serde::Serialize;
use std::path::Path;

/// Export the transcription as a Standard MIDI File
pub fn export_midi(state: &AnalysisState, output_dir: &Path, config: &Config) -> Result<()> {
    if state.note_count() == 0 {
        eprintln!("Warning: no notes detected, skipping MIDI export");
        return Ok(());
    }

    std::fs::create_dir_all(output_dir)?;
    let midi_path = output_dir.join("transcription.mid");

    let sequence = sequence_from_state(state, config)?;
    smf::write_file(&sequence, &midi_path)
        .map_err(|e| PolyError::MidiExportError(e.to_string()))?;

    println!(
        "Exported {} notes to {}",
        state.note_count(),
        midi_path.display()
    );
    Ok(())
}

/// Build a format-0 PPQ sequence from per-frame note emissions.
///
/// Each frame's notes sound from the frame's tick to the next frame
/// boundary, on the channel the octave routing assigned at detection time.
pub fn sequence_from_state(state: &AnalysisState, config: &Config) -> Result<Sequence> {
    let ppq = config.export.ppq;
    let tempo_bpm = config.export.tempo_bpm;
    if state.sr == 0 {
        return Err(PolyError::MidiExportError("sample rate is zero".to_string()));
    }

    let mut sequence = Sequence::new(DivisionType::Ppq, ppq, 0);
    let mut track = Track::new();

    let tempo_uspq = (60_000_000.0 / tempo_bpm) as u32;
    track.add(MidiEvent::new(
        0,
        MidiMessage::meta(
            META_TEMPO,
            vec![
                ((tempo_uspq >> 16) & 0xFF) as u8,
                ((tempo_uspq >> 8) & 0xFF) as u8,
                (tempo_uspq & 0xFF) as u8,
            ],
        ),
    ));
    track.add(MidiEvent::new(
        0,
        MidiMessage::meta(META_TIME_SIGNATURE, vec![4, 2, 24, 8]),
    ));

    let window_len = state.config.analysis.window_len;
    let ticks_per_sec = ppq as f64 * tempo_bpm as f64 / 60.0;
    let frame_tick = |frame: usize| -> u64 {
        (frame as f64 * window_len as f64 / state.sr as f64 * ticks_per_sec).round() as u64
    };

    for frame in 0..state.frames {
        let on_tick = frame_tick(frame);
        let off_tick = frame_tick(frame + 1);
        for note in &state.notes[frame] {
            track.add(MidiEvent::new(
                off_tick,
                MidiMessage::short(NOTE_OFF | note.channel, note.pitch, 0),
            ));
            track.add(MidiEvent::new(
                on_tick,
                MidiMessage::short(NOTE_ON | note.channel, note.pitch, note.velocity),
            ));
        }
    }

    track.ensure_end_of_track();
    sequence.tracks.push(track);
    Ok(sequence)
}

#[derive(Serialize)]
struct AnalysisResults<'a> {
    version: String,
    sample_rate: u32,
    total_samples: usize,
    duration_seconds: f32,
    window_len: usize,
    zero_pad: usize,
    frames: usize,
    note_count: usize,
    frames_detail: Vec<FrameSummary<'a>>,
}

#[derive(Serialize)]
struct FrameSummary<'a> {
    frame: usize,
    time_sec: f32,
    notes: Vec<NoteSummary<'a>>,
    pcp: Vec<f32>,
}

#[derive(Serialize)]
struct NoteSummary<'a> {
    label: String,
    #[serde(flatten)]
    note: &'a crate::note::Note,
}

/// Export per-frame analysis results to JSON
pub fn export_analysis(state: &AnalysisState, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;
    let analysis_path = output_dir.join("analysis.json");

    let window_len = state.config.analysis.window_len;
    let frames_detail = (0..state.frames)
        .map(|frame| FrameSummary {
            frame,
            time_sec: frame as f32 * window_len as f32 / state.sr as f32,
            notes: state.notes[frame]
                .iter()
                .map(|note| NoteSummary {
                    label: note.label(),
                    note,
                })
                .collect(),
            pcp: state.pcps.column(frame).to_vec(),
        })
        .collect();

    let analysis = AnalysisResults {
        version: env!("CARGO_PKG_VERSION").to_string(),
        sample_rate: state.sr,
        total_samples: state.n_samples(),
        duration_seconds: state.duration_sec(),
        window_len,
        zero_pad: state.config.analysis.zero_pad,
        frames: state.frames,
        note_count: state.note_count(),
        frames_detail,
    };

    let json = serde_json::to_string_pretty(&analysis)?;
    std::fs::write(&analysis_path, json)?;

    println!("Exported analysis results to {}", analysis_path.display());
    Ok(())
}
