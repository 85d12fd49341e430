//! Audio I/O and per-session analysis state

use crate::config::Config;
use crate::error::{PolyError, Result};
use crate::note::Note;
use hound::WavReader;
use ndarray::Array2;
use std::path::Path;

/// Analysis state containing loaded audio and per-frame results
#[derive(Debug, Clone)]
pub struct AnalysisState {
    /// Audio samples (mono, normalized to [-1, 1])
    pub y: Vec<f32>,
    /// Sample rate in Hz
    pub sr: u32,
    /// Configuration reference
    pub config: Config,
    /// Number of non-overlapping analysis frames
    pub frames: usize,
    /// Weighted magnitude spectrum per frame (half_len x frames)
    pub spectrogram: Array2<f32>,
    /// Normalized pitch-class profile per frame (12 x frames)
    pub pcps: Array2<f32>,
    /// Detected notes per frame, ordered by ascending detection bin
    pub notes: Vec<Vec<Note>>,
}

impl AnalysisState {
    /// Load an audio file and create the initial state
    pub fn load<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        let (y, sr) = load_audio_file(path)?;
        Ok(Self::from_samples(y, sr, config))
    }

    /// Create state from in-memory samples
    pub fn from_samples(y: Vec<f32>, sr: u32, config: &Config) -> Self {
        let window_len = config.analysis.window_len;
        let half_len = config.analysis.half_len();
        let frames = (y.len() as f64 / window_len as f64).round() as usize;
        AnalysisState {
            y,
            sr,
            config: config.clone(),
            frames,
            spectrogram: Array2::zeros((half_len, frames)),
            pcps: Array2::zeros((12, frames)),
            notes: vec![Vec::new(); frames],
        }
    }

    /// Audio duration in seconds
    pub fn duration_sec(&self) -> f32 {
        self.y.len() as f32 / self.sr as f32
    }

    /// Number of samples
    pub fn n_samples(&self) -> usize {
        self.y.len()
    }

    /// Total notes detected across all frames
    pub fn note_count(&self) -> usize {
        self.notes.iter().map(Vec::len).sum()
    }
}

/// Load an audio file and return normalized mono samples with sample rate
pub fn load_audio_file<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "wav" => load_wav_file(path),
        _ => Err(PolyError::InvalidAudioFormat(format!(
            "Unsupported audio format: {}",
            extension
        ))),
    }
}

/// Load WAV file
fn load_wav_file<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let mut reader = WavReader::open(path).map_err(|e| PolyError::AudioFileError(e.to_string()))?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.channels > 2 {
        return Err(PolyError::InvalidAudioFormat(format!(
            "Unsupported channel count: {}",
            spec.channels
        )));
    }

    if !matches!(
        spec.sample_format,
        hound::SampleFormat::Int | hound::SampleFormat::Float
    ) {
        return Err(PolyError::InvalidAudioFormat(
            "Unsupported sample format".to_string(),
        ));
    }

    if spec.bits_per_sample > 32 {
        return Err(PolyError::InvalidAudioFormat(format!(
            "Unsupported bit depth: {}",
            spec.bits_per_sample
        )));
    }

    let sr = spec.sample_rate;
    let mut samples: Vec<f32> = Vec::with_capacity(reader.len() as usize);

    match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            for sample in reader.samples::<i32>() {
                let sample =
                    sample.map_err(|e| PolyError::AudioFileError(e.to_string()))? as f32 / max_value;
                samples.push(sample);
            }
        }
        hound::SampleFormat::Float => {
            for sample in reader.samples::<f32>() {
                samples.push(sample.map_err(|e| PolyError::AudioFileError(e.to_string()))?);
            }
        }
    }

    // Downmix stereo to mono by channel average
    let samples = if spec.channels == 2 {
        samples
            .chunks_exact(2)
            .map(|pair| 0.5 * (pair[0] + pair[1]))
            .collect()
    } else {
        samples
    };

    Ok((samples, sr))
}

/// Validate audio file format and content
pub fn validate_audio_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PolyError::InputValidationError(format!(
            "Audio file does not exist: {}",
            path.display()
        )));
    }

    let (samples, sr) = load_audio_file(path)?;

    if samples.is_empty() {
        return Err(PolyError::InputValidationError(
            "Audio file contains no samples".to_string(),
        ));
    }

    if !(8000..=192000).contains(&sr) {
        return Err(PolyError::UnsupportedSampleRate(sr));
    }

    Ok(())
}
