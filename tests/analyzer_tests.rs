//! Validation tests for the frame analyzer: pitch detection, PCP, and
//! harmonic suppression

use poly2midi::analyzer::{bin_weight, FrameAnalyzer};
use poly2midi::config::{BinWeight, Config};
use poly2midi::note::{freq_to_pitch, pitch_to_freq};
use std::f32::consts::PI;

const SR: u32 = 44100;

/// Generate one analysis frame of a pure tone
fn generate_tone(freq: f32, amplitude: f32, n_samples: usize) -> Vec<f32> {
    (0..n_samples)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SR as f32).sin())
        .collect()
}

/// Generate one frame of a mixture of tones
fn generate_mixture(components: &[(f32, f32)], n_samples: usize) -> Vec<f32> {
    let mut frame = vec![0.0f32; n_samples];
    for &(freq, amplitude) in components {
        for (i, sample) in frame.iter_mut().enumerate() {
            *sample += amplitude * (2.0 * PI * freq * i as f32 / SR as f32).sin();
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_freq_round_trip() {
        assert_eq!(freq_to_pitch(440.0), 69);
        assert!((pitch_to_freq(69) - 440.0).abs() < 1e-3);
        assert_eq!(freq_to_pitch(261.63), 60);
    }

    #[test]
    fn test_freq_to_pitch_out_of_range() {
        assert_eq!(freq_to_pitch(0.0), 0);
        assert_eq!(freq_to_pitch(-10.0), 0);
        // Below the usable pitch range
        assert_eq!(freq_to_pitch(4.0), 0);
        // Above pitch 127
        assert_eq!(freq_to_pitch(20000.0), 0);
    }

    #[test]
    fn test_bin_weight_families() {
        assert_eq!(bin_weight(BinWeight::Uniform, 0.7), 1.0);
        assert_eq!(bin_weight(BinWeight::Discrete, 0.2), 1.0);
        assert_eq!(bin_weight(BinWeight::Discrete, 0.200001), 0.0);
        assert!((bin_weight(BinWeight::Linear, 0.25) - 0.75).abs() < 1e-6);
        assert!((bin_weight(BinWeight::Quadratic, 0.5) - 0.75).abs() < 1e-6);
        assert!((bin_weight(BinWeight::Exponential, 0.0) - 1.0).abs() < 1e-6);
        assert!((bin_weight(BinWeight::Exponential, 1.0) - (-1.0f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_pure_tone_a4_yields_single_note() {
        let config = Config::default();
        let mut analyzer = FrameAnalyzer::new(&config.analysis, SR).unwrap();
        let frame = generate_tone(440.0, 1.0, config.analysis.window_len);

        let result = analyzer.analyze(&frame);

        assert_eq!(
            result.notes.len(),
            1,
            "expected exactly one note, got {:?}",
            result.notes
        );
        let note = &result.notes[0];
        assert_eq!(note.pitch, 69);
        assert_eq!(note.label(), "A4");
        let bin_spacing = SR as f32 / config.analysis.padded_len() as f32;
        assert!(
            (note.frequency - 440.0).abs() < bin_spacing,
            "frequency {} too far from 440",
            note.frequency
        );
    }

    #[test]
    fn test_octave_harmonic_is_suppressed() {
        let config = Config::default();
        let mut analyzer = FrameAnalyzer::new(&config.analysis, SR).unwrap();
        let frame = generate_mixture(&[(220.0, 1.0), (440.0, 0.5)], config.analysis.window_len);

        let result = analyzer.analyze(&frame);

        assert_eq!(
            result.notes.len(),
            1,
            "the quieter octave should be suppressed, got {:?}",
            result.notes
        );
        assert_eq!(result.notes[0].pitch, 57, "expected A3");
    }

    #[test]
    fn test_harmonics_inactive_emits_both_octaves() {
        let mut config = Config::default();
        config.analysis.harmonics_active = false;
        let mut analyzer = FrameAnalyzer::new(&config.analysis, SR).unwrap();
        let frame = generate_mixture(&[(220.0, 1.0), (440.0, 0.5)], config.analysis.window_len);

        let result = analyzer.analyze(&frame);

        let pitches: Vec<u8> = result.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![57, 69]);
    }

    #[test]
    fn test_masked_octave_yields_no_notes() {
        let mut config = Config::default();
        config.analysis.octave_active[4] = false;
        let mut analyzer = FrameAnalyzer::new(&config.analysis, SR).unwrap();
        let frame = generate_tone(440.0, 1.0, config.analysis.window_len);

        let result = analyzer.analyze(&frame);

        assert!(
            result.notes.is_empty(),
            "masked octave should emit nothing, got {:?}",
            result.notes
        );
    }

    #[test]
    fn test_pcp_max_is_one_or_zero() {
        let config = Config::default();
        let mut analyzer = FrameAnalyzer::new(&config.analysis, SR).unwrap();

        let tone = generate_tone(440.0, 1.0, config.analysis.window_len);
        let result = analyzer.analyze(&tone);
        let max = result.pcp.iter().cloned().fold(0.0f32, f32::max);
        assert!((max - 1.0).abs() < 1e-6, "PCP max should be 1, got {}", max);
        // The A pitch class carries the energy
        assert!((result.pcp[9] - 1.0).abs() < 1e-6);

        let silence = vec![0.0f32; config.analysis.window_len];
        let result = analyzer.analyze(&silence);
        let max = result.pcp.iter().cloned().fold(0.0f32, f32::max);
        assert_eq!(max, 0.0, "PCP of silence stays all zero");
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_note_bounds_and_ordering() {
        let config = Config::default();
        let mut analyzer = FrameAnalyzer::new(&config.analysis, SR).unwrap();
        // C4 + E4 + G4, distinct pitch classes so all survive
        let frame = generate_mixture(
            &[(261.63, 0.8), (329.63, 0.7), (392.0, 0.9)],
            config.analysis.window_len,
        );

        let result = analyzer.analyze(&frame);

        assert_eq!(result.notes.len(), 3, "got {:?}", result.notes);
        for note in &result.notes {
            assert!((1..=127).contains(&note.pitch));
            assert!(note.velocity <= 127);
            assert!((0..8).contains(&note.octave));
        }
        // Ascending bin index means ascending detection frequency
        for pair in result.notes.windows(2) {
            assert!(pair[0].frequency < pair[1].frequency);
        }
        // No duplicate (pitch, amplitude) entries
        for (i, a) in result.notes.iter().enumerate() {
            for b in &result.notes[i + 1..] {
                assert!(a.pitch != b.pitch || a.amplitude != b.amplitude);
            }
        }
    }

    #[test]
    fn test_linear_eq_scales_amplitudes() {
        let config = Config::default();
        let mut analyzer = FrameAnalyzer::new(&config.analysis, SR).unwrap();
        let frame = generate_tone(440.0, 0.5, config.analysis.window_len);
        let baseline = analyzer.analyze(&frame);

        let mut eq_config = Config::default();
        eq_config.analysis.linear_eq_active = true;
        eq_config.analysis.linear_eq_intercept = 2.0;
        eq_config.analysis.linear_eq_slope = 0.0;
        let mut eq_analyzer = FrameAnalyzer::new(&eq_config.analysis, SR).unwrap();
        let boosted = eq_analyzer.analyze(&frame);

        assert_eq!(baseline.notes.len(), 1);
        assert_eq!(boosted.notes.len(), 1);
        assert!(
            (boosted.notes[0].amplitude - 2.0 * baseline.notes[0].amplitude).abs()
                < 0.01 * baseline.notes[0].amplitude
        );
    }

    #[test]
    fn test_short_tail_frame_is_zero_padded() {
        let config = Config::default();
        let mut analyzer = FrameAnalyzer::new(&config.analysis, SR).unwrap();
        // Half a window of signal; the rest of the window must read as zeros
        let frame = generate_tone(440.0, 1.0, config.analysis.window_len / 2);

        let result = analyzer.analyze(&frame);

        assert!(
            result.notes.iter().any(|n| n.pitch == 69),
            "truncated tone should still be detected, got {:?}",
            result.notes
        );
    }

    #[test]
    fn test_tone_survives_low_noise() {
        let config = Config::default();
        let mut analyzer = FrameAnalyzer::new(&config.analysis, SR).unwrap();
        let mut frame = generate_tone(440.0, 1.0, config.analysis.window_len);
        for sample in frame.iter_mut() {
            *sample += (rand::random::<f32>() - 0.5) * 0.002;
        }

        let result = analyzer.analyze(&frame);

        assert!(result.notes.iter().any(|n| n.pitch == 69));
    }

    #[test]
    fn test_rejects_invalid_window_len() {
        let mut config = Config::default();
        config.analysis.window_len = 1000;
        assert!(FrameAnalyzer::new(&config.analysis, SR).is_err());

        config.analysis.window_len = 2048;
        config.analysis.zero_pad = 3;
        assert!(FrameAnalyzer::new(&config.analysis, SR).is_err());
    }
}
