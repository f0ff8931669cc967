use std::{
    fs::{create_dir_all, File},
    io::{BufReader, Write},
    path::PathBuf,
    time::Duration,
};

use home::home_dir;
use midisquare::{MidiError, OverflowPolicy, DEFAULT_AMPLITUDE, DEFAULT_SETTLE_DELAY, SAMPLE_RATE};
use serde::{Deserialize, Serialize};

/// Number of frames per audio buffer.
const BUFFER_FRAMES: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sample_rate: u32,
    pub buffer_frames: u32,
    pub settle_delay_ms: u64,
    pub voice_amplitude: f32,
    pub overflow_policy: OverflowPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            buffer_frames: BUFFER_FRAMES,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            voice_amplitude: DEFAULT_AMPLITUDE,
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl Config {
    // folder placed in $HOME directory
    const FOLDER: &'static str = ".midisquare";

    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    fn get_base_path() -> Result<PathBuf, MidiError> {
        let home = home_dir()
            .ok_or_else(|| MidiError::ConfigError("Could not find home directory".to_string()))?;
        let path = home.join(Self::FOLDER);
        Ok(path)
    }

    fn get_path() -> Result<PathBuf, MidiError> {
        let base = Self::get_base_path()?;
        Ok(base.join("config.json"))
    }

    /// Creates config if it does not exist
    pub fn read_config() -> Result<Self, MidiError> {
        let base_path = Self::get_base_path()?;
        if !base_path.exists() {
            create_dir_all(base_path)?;
        }
        let config_path = Self::get_path()?;
        if !config_path.exists() {
            // create default config
            Self::default().save_config()?;
        }
        let file = File::open(config_path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader).map_err(|err| {
            MidiError::ConfigError(format!("Could not read local configuration {err:}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Assumes the config folder exists
    pub fn save_config(&self) -> Result<(), MidiError> {
        let config_path = Self::get_path()?;
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            MidiError::ConfigError(format!("Could not save local configuration {err:}"))
        })?;
        let mut file = File::create(config_path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), MidiError> {
        if self.sample_rate == 0 || self.buffer_frames == 0 {
            return Err(MidiError::ConfigError(
                "sample rate and buffer frames must be positive".to_string(),
            ));
        }
        if !(self.voice_amplitude > 0.0 && self.voice_amplitude <= 1.0) {
            return Err(MidiError::ConfigError(format!(
                "voice amplitude must be in (0, 1], got {}",
                self.voice_amplitude
            )));
        }
        Ok(())
    }
}
