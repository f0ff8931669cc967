use crate::error::MidiError;

/// Default tempo in microseconds per quarter note (120 BPM).
pub const DEFAULT_TEMPO: u32 = 500_000;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Seconds covered by `delta_ticks` at the given resolution and tempo.
pub fn elapsed_seconds(delta_ticks: u32, ticks_per_beat: u32, tempo_us_per_beat: u32) -> f64 {
    f64::from(delta_ticks) * f64::from(tempo_us_per_beat)
        / (f64::from(ticks_per_beat) * MICROS_PER_SECOND)
}

/// Rejects tick resolutions that cannot be converted to time.
pub fn validate_ticks_per_beat(ticks_per_beat: i32) -> Result<u32, MidiError> {
    match u32::try_from(ticks_per_beat) {
        Ok(ticks) if ticks > 0 => Ok(ticks),
        _ => Err(MidiError::MalformedTempo(ticks_per_beat)),
    }
}

/// Running clock of a decode pass.
///
/// The tempo is only used for deltas converted after `set_tempo`.
#[derive(Debug, Clone)]
pub struct TickClock {
    ticks_per_beat: u32,
    tempo: u32,   // microseconds per quarter note
    seconds: f64, // absolute time of the last converted tick
}

impl TickClock {
    pub const fn new(ticks_per_beat: u32) -> Self {
        Self {
            ticks_per_beat,
            tempo: DEFAULT_TEMPO,
            seconds: 0.0,
        }
    }

    /// Moves the clock forward and returns the new absolute time in seconds.
    pub fn advance(&mut self, delta_ticks: u32) -> f64 {
        self.seconds += elapsed_seconds(delta_ticks, self.ticks_per_beat, self.tempo);
        self.seconds
    }

    #[allow(clippy::missing_const_for_fn)]
    pub fn set_tempo(&mut self, tempo: u32) {
        self.tempo = tempo;
    }

    pub const fn tempo(&self) -> u32 {
        self.tempo
    }

    pub const fn now(&self) -> f64 {
        self.seconds
    }
}
