//! Configuration system for the audio-to-MIDI engine

use serde::{Deserialize, Serialize};

/// Window tapering families supported by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowType {
    Rectangular,
    Hann,
    Hamming,
    Blackman,
    BlackmanHarris,
}

/// Per-bin semitone-distance weighting families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinWeight {
    Uniform,
    Discrete,
    Linear,
    Quadratic,
    Exponential,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub analysis: AnalysisConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            analysis: AnalysisConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Spectral analysis configuration, immutable per session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analysis window length in samples (power of two)
    pub window_len: usize,
    /// Zero-padding factor applied before the FFT
    pub zero_pad: usize,
    pub window: WindowType,
    pub bin_weight: BinWeight,
    /// Minimum magnitude for a bin to qualify as a peak
    pub peak_threshold: f32,
    /// Reinforce the spectrum with the normalized pitch-class profile
    pub pcp_active: bool,
    /// Suppress repeated pitch classes with lower amplitude
    pub harmonics_active: bool,
    pub linear_eq_active: bool,
    pub linear_eq_intercept: f32,
    pub linear_eq_slope: f32,
    /// Octaves 0..=7 eligible for note detection
    pub octave_active: [bool; 8],
    /// MIDI channel assigned to notes detected in each octave
    pub octave_channel: [u8; 8],
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_len: 2048,
            zero_pad: 4,
            window: WindowType::Hann,
            bin_weight: BinWeight::Uniform,
            peak_threshold: 20.0,
            pcp_active: true,
            harmonics_active: true,
            linear_eq_active: false,
            linear_eq_intercept: 1.0,
            linear_eq_slope: 0.0,
            octave_active: [true; 8],
            octave_channel: [0; 8],
        }
    }
}

impl AnalysisConfig {
    /// FFT length after zero padding
    pub fn padded_len(&self) -> usize {
        self.window_len * self.zero_pad
    }

    /// Length of the non-redundant half spectrum
    pub fn half_len(&self) -> usize {
        self.padded_len() / 2
    }
}

/// MIDI export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Pulses per quarter note in the written file
    pub ppq: u16,
    pub tempo_bpm: f32,
    /// Also write the JSON analysis artifact
    pub write_analysis: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            ppq: 960,
            tempo_bpm: 120.0,
            write_analysis: true,
        }
    }
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    let analysis = &config.analysis;

    if analysis.window_len < 2 || !analysis.window_len.is_power_of_two() {
        anyhow::bail!(
            "window_len must be a power of two >= 2, got {}",
            analysis.window_len
        );
    }

    if !matches!(analysis.zero_pad, 1 | 2 | 4 | 8) {
        anyhow::bail!("zero_pad must be one of 1, 2, 4, 8, got {}", analysis.zero_pad);
    }

    if !analysis.peak_threshold.is_finite() || analysis.peak_threshold < 0.0 {
        anyhow::bail!("peak_threshold must be finite and >= 0");
    }

    for (octave, &channel) in analysis.octave_channel.iter().enumerate() {
        if channel > 15 {
            anyhow::bail!(
                "octave_channel[{}] must be a MIDI channel 0..=15, got {}",
                octave,
                channel
            );
        }
    }

    if config.export.ppq == 0 {
        anyhow::bail!("export ppq must be > 0");
    }

    if !config.export.tempo_bpm.is_finite() || config.export.tempo_bpm <= 0.0 {
        anyhow::bail!("export tempo_bpm must be > 0");
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
