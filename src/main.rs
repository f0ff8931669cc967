use crate::AppError::ConfigError;
use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use midisquare::{
    encode_track, extract_notes, load_smf, ActiveNotes, EncodedTrack, LiveScheduler, MidiError,
    MidiFile, OverflowPolicy, SquareSynth, SynthSource,
};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod config;
mod output_stream;

/// Extra time given to the stream to play the tail of the last buffer.
const TAIL_DELAY: Duration = Duration::from_millis(200);

fn main() {
    let result = main_result();
    std::process::exit(match result {
        Ok(()) => 0,
        Err(err) => {
            // use Display instead of Debug for user friendly error messages
            log::error!("{err}");
            1
        }
    });
}

pub fn main_result() -> Result<(), AppError> {
    // setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("midisquare=info"))
        .init();

    // args
    let args = CliArgs::parse();

    // read local config
    let local_config = Config::read_config()?;

    match args.command {
        Command::Convert {
            midi_file,
            output,
            overflow,
        } => {
            let policy = overflow.map_or(local_config.overflow_policy, OverflowPolicy::from);
            convert(&midi_file, output.as_deref(), policy)
        }
        Command::Play { midi_file } => play(&midi_file, &local_config),
    }
}

fn read_midi_file(path: &Path) -> Result<MidiFile, AppError> {
    if !path.exists() {
        return Err(ConfigError(format!("MIDI file not found {path:?}")));
    }
    log::info!("Reading MIDI file {path:?}");
    let data = std::fs::read(path)?;
    Ok(load_smf(&data)?)
}

#[derive(Debug, Serialize)]
struct ConvertedTrack {
    index: usize,
    #[serde(flatten)]
    encoded: EncodedTrack,
}

fn convert(path: &Path, output: Option<&Path>, policy: OverflowPolicy) -> Result<(), AppError> {
    let file = read_midi_file(path)?;
    let tracks: Vec<ConvertedTrack> = extract_notes(&file)?
        .iter()
        .map(|track| encode_track(track, policy))
        .enumerate()
        .map(|(index, encoded)| {
            log::info!(
                "Track {index}: {} records, {} overflows, {} unclosed notes",
                encoded.records.len(),
                encoded.overflows.len(),
                encoded.unclosed_notes
            );
            ConvertedTrack { index, encoded }
        })
        .collect();

    let json = serde_json::to_string_pretty(&tracks)
        .map_err(|err| AppError::OtherError(format!("Could not serialize records {err}")))?;
    match output {
        Some(output) => {
            std::fs::write(output, json)?;
            log::info!("Records written to {output:?}");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn play(path: &Path, config: &Config) -> Result<(), AppError> {
    let file = read_midi_file(path)?;
    let active = ActiveNotes::new();
    // decode before opening the device so a malformed file fails early
    let scheduler = LiveScheduler::new(&file, active.clone(), config.settle_delay())?;

    let synth = SquareSynth::new(active, config.sample_rate, config.voice_amplitude);
    let stream = output_stream::new_output_stream(
        SynthSource::new(synth),
        config.sample_rate,
        config.buffer_frames,
    )?;

    let handle = scheduler.start()?;
    let outcome = handle.join()?;
    log::info!("Playback ended: {outcome:?}");
    std::thread::sleep(TAIL_DELAY);

    // Drop stream
    drop(stream);
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a MIDI file into note records, printed as JSON.
    Convert {
        /// Path to the MIDI file.
        midi_file: PathBuf,
        /// Optional output file, defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// What to do with notes that do not fit their record.
        #[arg(long, value_enum)]
        overflow: Option<OverflowArg>,
    },
    /// Play a MIDI file with square waves on the default output device.
    Play {
        /// Path to the MIDI file.
        midi_file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OverflowArg {
    Clamp,
    Skip,
}

impl From<OverflowArg> for OverflowPolicy {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Clamp => Self::Clamp,
            OverflowArg::Skip => Self::Skip,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("parsing error: {0}")]
    ParsingError(String),
    #[error("audio error: {0}")]
    AudioError(String),
    #[error("other error: {0}")]
    OtherError(String),
}

impl From<MidiError> for AppError {
    fn from(error: MidiError) -> Self {
        match error {
            err @ MidiError::MalformedTempo(_) => Self::ParsingError(err.to_string()),
            MidiError::ParsingError(s) => Self::ParsingError(s),
            MidiError::ConfigError(s) => Self::ConfigError(s),
            MidiError::AudioError(s) => Self::AudioError(s),
            MidiError::IoError(s) => Self::OtherError(s),
        }
    }
}

impl From<io::Error> for AppError {
    fn from(error: io::Error) -> Self {
        Self::OtherError(error.to_string())
    }
}
