//! Polyphonic Audio-to-MIDI Transcription Engine
//!
//! A sliding-window spectral analyzer that consumes a monophonic audio
//! stream and emits, per frame, the set of detected musical notes, together
//! with the MIDI sequence model and file codec needed to serialize results.

pub mod analyzer;
pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod midi;
pub mod note;
pub mod smf;
pub mod spectral;
pub mod transform;

pub use audio::AnalysisState;
pub use config::Config;
pub use error::{PolyError, Result as PolyResult};

use analyzer::FrameAnalyzer;
use std::path::Path;

/// Main processing pipeline for audio-to-MIDI transcription
pub struct PolyToMidi {
    config: Config,
}

impl PolyToMidi {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Process an audio file and generate MIDI output
    pub fn process<P: AsRef<Path>>(&self, input_path: P, output_dir: P) -> PolyResult<()> {
        let mut state = AnalysisState::load(input_path, &self.config)?;

        self.run_analysis(&mut state)?;

        self.export_results(&state, output_dir.as_ref())?;

        Ok(())
    }

    /// Run the frame-based spectral analysis over the whole signal.
    ///
    /// The signal is sliced into non-overlapping frames of `window_len`
    /// samples; a short tail is zero-padded inside the last window.
    pub fn run_analysis(&self, state: &mut AnalysisState) -> PolyResult<()> {
        println!(
            "Analyzing {} frames ({} samples at {} Hz)",
            state.frames,
            state.n_samples(),
            state.sr
        );

        let mut analyzer = FrameAnalyzer::new(&self.config.analysis, state.sr)?;
        let window_len = self.config.analysis.window_len;

        for frame in 0..state.frames {
            let start = frame * window_len;
            let end = (start + window_len).min(state.y.len());
            let result = analyzer.analyze(&state.y[start..end]);

            for (slot, value) in state
                .spectrogram
                .column_mut(frame)
                .iter_mut()
                .zip(&result.spectrum)
            {
                *slot = *value;
            }
            for (slot, value) in state.pcps.column_mut(frame).iter_mut().zip(&result.pcp) {
                *slot = *value;
            }
            state.notes[frame] = result.notes;
        }

        println!("  ✓ Detected {} notes", state.note_count());
        Ok(())
    }

    /// Export MIDI and analysis results
    fn export_results(&self, state: &AnalysisState, output_dir: &Path) -> PolyResult<()> {
        export::export_midi(state, output_dir, &self.config)?;
        if self.config.export.write_analysis {
            export::export_analysis(state, output_dir)?;
        }
        Ok(())
    }
}

/// Validate configuration and input files
pub fn validate_input<P: AsRef<Path>>(input_path: P, config: &Config) -> PolyResult<()> {
    audio::validate_audio_file(input_path)?;

    config::validate_config(config).map_err(|e| PolyError::InvalidConfig(e.to_string()))?;

    Ok(())
}
