use clap::{Parser, Subcommand};
use poly2midi::{validate_input, Config, PolyToMidi};
use std::path::PathBuf;

/// Polyphonic Audio-to-MIDI Transcription Engine
#[derive(Parser)]
#[command(name = "poly2midi")]
#[command(about = "Transcribe audio recordings to MIDI via spectral analysis")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an audio file and generate MIDI output
    Analyze {
        /// Input audio file (WAV)
        input: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Analysis window length in samples (power of two)
        #[arg(long)]
        window: Option<usize>,

        /// Peak detection threshold
        #[arg(long)]
        threshold: Option<f32>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Quiet output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            config,
            window,
            threshold,
            verbose,
            quiet,
        } => {
            if verbose && quiet {
                anyhow::bail!("Cannot specify both --verbose and --quiet");
            }

            // Load configuration
            let mut config = if let Some(config_path) = config {
                poly2midi::config::load_config(config_path)?
            } else {
                Config::default()
            };

            if let Some(window) = window {
                config.analysis.window_len = window;
            }
            if let Some(threshold) = threshold {
                config.analysis.peak_threshold = threshold;
            }

            // Validate input
            validate_input(&input, &config)?;

            // Create processor
            let processor = PolyToMidi::new(config);

            if !quiet {
                println!("Processing {}...", input.display());
            }

            processor.process(&input, &output)?;

            if !quiet {
                println!("Results saved to {}", output.display());
            }
        }
        Commands::ValidateConfig { config } => {
            let config = poly2midi::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}
