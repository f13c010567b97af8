use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use undertone::pipeline::Settings;
use undertone::{embed_file, extract_file, probe_capacity};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Tunables shared by all subcommands. Unset flags fall back to the
/// settings file (if given) and then to the built-in defaults.
#[derive(Args)]
struct Tunables {
    /// JSON settings file with "stft" and "embed" sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum carrier frequency in Hz
    #[arg(long)]
    hz: Option<f32>,

    /// Minimum carrier level in dB
    #[arg(long)]
    amplitude: Option<f32>,

    /// Length prefix width in bits
    #[arg(long)]
    offset: Option<u32>,

    /// Fraction of frames eligible as carriers
    #[arg(long)]
    x_ratio: Option<f32>,

    /// dB floor below which the reader falls back to a 0 bit
    #[arg(long)]
    reader_thresh: Option<f32>,

    /// dB boost applied when flipping a cell's parity
    #[arg(long)]
    boost_db: Option<f32>,

    /// FFT size
    #[arg(long)]
    n_fft: Option<usize>,

    /// Samples between consecutive frames
    #[arg(long)]
    hop_length: Option<usize>,

    /// Window length (defaults to the FFT size)
    #[arg(long)]
    win_length: Option<usize>,

    /// Disable reflect-padded frame centering
    #[arg(long)]
    no_center: bool,
}

impl Tunables {
    fn into_settings(self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)
                .with_context(|| format!("reading settings file {:?}", path))?,
            None => Settings::default(),
        };

        if let Some(hz) = self.hz {
            settings.embed.hz = hz;
        }
        if let Some(amplitude) = self.amplitude {
            settings.embed.amplitude = amplitude;
        }
        if let Some(offset) = self.offset {
            settings.embed.offset = offset;
        }
        if let Some(x_ratio) = self.x_ratio {
            settings.embed.x_ratio = x_ratio;
        }
        if let Some(reader_thresh) = self.reader_thresh {
            settings.embed.reader_thresh = reader_thresh;
        }
        if let Some(boost_db) = self.boost_db {
            settings.embed.boost_db = boost_db;
        }
        if let Some(n_fft) = self.n_fft {
            settings.stft.n_fft = n_fft;
            settings.stft.win_length = settings.stft.win_length.min(n_fft);
        }
        if let Some(hop_length) = self.hop_length {
            settings.stft.hop_length = hop_length;
        }
        if let Some(win_length) = self.win_length {
            settings.stft.win_length = win_length;
        }
        if self.no_center {
            settings.stft.center = false;
        }
        Ok(settings)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a payload file inside a cover WAV
    Embed {
        /// Cover audio file (WAV)
        #[arg(short, long)]
        cover: PathBuf,

        /// Payload file to hide
        #[arg(short, long)]
        payload: PathBuf,

        /// Output stego WAV path
        #[arg(short, long, default_value = "output.wav")]
        output: PathBuf,

        #[command(flatten)]
        tunables: Tunables,
    },

    /// Recover a payload from a stego WAV
    Extract {
        /// Stego audio file (WAV)
        #[arg(short, long)]
        stego: PathBuf,

        /// Output payload path
        #[arg(short, long, default_value = "payload.bin")]
        output: PathBuf,

        #[command(flatten)]
        tunables: Tunables,
    },

    /// Report how many carrier bits a cover WAV offers
    Capacity {
        /// Cover audio file (WAV)
        #[arg(short, long)]
        cover: PathBuf,

        #[command(flatten)]
        tunables: Tunables,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Embed {
            cover,
            payload,
            output,
            tunables,
        } => {
            let settings = tunables.into_settings()?;
            let data = fs::read(&payload)
                .with_context(|| format!("reading payload file {:?}", payload))?;
            let report = embed_file(&cover, &data, &output, &settings)?;
            info!(
                "Wrote {:?}: {} of {} carrier bits used, {} cells modified",
                output, report.bits_written, report.capacity, report.modified
            );
        }

        Commands::Extract {
            stego,
            output,
            tunables,
        } => {
            let settings = tunables.into_settings()?;
            let data = extract_file(&stego, &settings)?;
            fs::write(&output, &data)
                .with_context(|| format!("writing payload file {:?}", output))?;
            info!("Recovered {} payload bytes into {:?}", data.len(), output);
        }

        Commands::Capacity { cover, tunables } => {
            let settings = tunables.into_settings()?;
            let capacity = probe_capacity(&cover, &settings)?;
            println!(
                "{} carrier bits ({} bytes after the {}-bit length prefix)",
                capacity,
                capacity.saturating_sub(settings.embed.offset as usize) / 8,
                settings.embed.offset
            );
        }
    }

    Ok(())
}
