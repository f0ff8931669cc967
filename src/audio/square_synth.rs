use crate::audio::active_notes::ActiveNotes;
use crate::midi::note_extractor::pitch_to_frequency;

pub const SAMPLE_RATE: u32 = 44100; // number of samples per second

/// Per voice amplitude, keeps the mix well below clipping.
pub const DEFAULT_AMPLITUDE: f32 = 0.1;

/// Produces the next buffer of mono samples for an audio output.
///
/// Called from the real-time audio thread: implementations must not block.
pub trait RenderSource: Send {
    fn render(&mut self, buffer: &mut [f32]);
}

/// Square wave mixer over the currently active notes.
#[derive(Debug, Clone)]
pub struct SquareSynth {
    active: ActiveNotes,
    sample_rate: u32,
    amplitude: f32,
}

impl SquareSynth {
    pub const fn new(active: ActiveNotes, sample_rate: u32, amplitude: f32) -> Self {
        Self {
            active,
            sample_rate,
            amplitude,
        }
    }

    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Fills `output` with the mix starting at `start_time` seconds.
    ///
    /// The phase is derived from the absolute time of each sample so consecutive
    /// buffers join without discontinuity.
    pub fn render(&self, output: &mut [f32], start_time: f64) {
        let pitches = self.active.snapshot();
        output.fill(0.0);
        if pitches.is_empty() {
            return;
        }

        let sample_rate = f64::from(self.sample_rate);
        for pitch in pitches.iter() {
            let frequency = pitch_to_frequency(pitch);
            for (i, sample) in output.iter_mut().enumerate() {
                let time = start_time + i as f64 / sample_rate;
                let phase = (frequency * time).fract();
                *sample += if phase < 0.5 {
                    self.amplitude
                } else {
                    -self.amplitude
                };
            }
        }

        let voices = pitches.len() as f32;
        output.iter_mut().for_each(|sample| *sample /= voices);
    }
}

/// [`RenderSource`] driving a [`SquareSynth`] from a running frame counter.
#[derive(Debug, Clone)]
pub struct SynthSource {
    synth: SquareSynth,
    rendered_frames: u64,
}

impl SynthSource {
    pub const fn new(synth: SquareSynth) -> Self {
        Self {
            synth,
            rendered_frames: 0,
        }
    }

    pub const fn rendered_frames(&self) -> u64 {
        self.rendered_frames
    }
}

impl RenderSource for SynthSource {
    fn render(&mut self, buffer: &mut [f32]) {
        let start_time = self.rendered_frames as f64 / f64::from(self.synth.sample_rate());
        self.synth.render(buffer, start_time);
        self.rendered_frames += buffer.len() as u64;
    }
}
