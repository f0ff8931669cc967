use crate::error::MidiError;
use crate::midi::event_decoder::{decode_tracks, TimedMessage};
use crate::midi::midi_event::{MessageKind, MidiFile};
use std::collections::HashMap;

/// Pitch of A4.
const A4_PITCH: f64 = 69.0;
/// Frequency of A4 in Hz.
const A4_FREQUENCY: f64 = 440.0;

/// Equal temperament frequency of a MIDI pitch.
pub fn pitch_to_frequency(pitch: u8) -> f64 {
    A4_FREQUENCY * 2_f64.powf((f64::from(pitch) - A4_PITCH) / 12.0)
}

/// A closed note interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Seconds since the start of the track.
    pub start_time: f64,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Duration in milliseconds.
    pub duration_ms: f64,
    pub velocity: u8,
}

/// Notes of one track, in the order they were closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackNotes {
    pub notes: Vec<Note>,
    /// Note-ons never matched by a note-off, dropped at the end of the track.
    pub unclosed: usize,
}

/// Pairs note-on and note-off messages of a single track.
#[derive(Debug, Default)]
pub struct NoteExtractor {
    held: HashMap<u8, (f64, u8)>, // pitch -> (start time, velocity)
    notes: Vec<Note>,
}

impl NoteExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, time: f64, message: MessageKind) {
        if let Some((pitch, velocity)) = message.note_start() {
            // a re-triggered pitch replaces the held one
            self.held.insert(pitch, (time, velocity));
        } else if let Some(pitch) = message.note_release() {
            if let Some((start_time, velocity)) = self.held.remove(&pitch) {
                self.notes.push(Note {
                    start_time,
                    frequency: pitch_to_frequency(pitch),
                    duration_ms: (time - start_time) * 1000.0,
                    velocity,
                });
            }
        }
    }

    pub fn finish(self) -> TrackNotes {
        TrackNotes {
            notes: self.notes,
            unclosed: self.held.len(),
        }
    }
}

/// Extracts the notes of a decoded track.
pub fn extract_track(messages: &[TimedMessage]) -> TrackNotes {
    let mut extractor = NoteExtractor::new();
    for timed in messages {
        extractor.process(timed.time, timed.message);
    }
    extractor.finish()
}

/// Offline path: decodes every track with its own tempo and extracts its notes.
pub fn extract_notes(file: &MidiFile) -> Result<Vec<TrackNotes>, MidiError> {
    let tracks = decode_tracks(file)?;
    let notes = tracks
        .iter()
        .enumerate()
        .map(|(track_id, messages)| {
            let track_notes = extract_track(messages);
            if track_notes.unclosed > 0 {
                log::debug!(
                    "track {track_id}: dropped {} unclosed notes",
                    track_notes.unclosed
                );
            }
            track_notes
        })
        .collect();
    Ok(notes)
}
