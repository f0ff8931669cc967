use crate::midi::note_extractor::{Note, TrackNotes};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Start time is stored on 25 bits by the playback device.
pub const MAX_START_TIME_MS: u32 = (1 << 25) - 1;
pub const MAX_FREQUENCY_HZ: u16 = u16::MAX;
pub const MAX_DURATION_MS: u16 = u16::MAX;
/// Velocity is stored on 7 bits.
pub const MAX_VELOCITY: u8 = 127;

/// Fixed-width record of a note, as consumed by the table emitter.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct NoteRecord {
    pub start_time_ms: u32,
    pub frequency_hz: u16,
    pub duration_ms: u16,
    pub velocity: u8,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    StartTime,
    Frequency,
    Duration,
    Velocity,
}

impl RecordField {
    pub const fn max(self) -> u64 {
        match self {
            Self::StartTime => MAX_START_TIME_MS as u64,
            Self::Frequency => MAX_FREQUENCY_HZ as u64,
            Self::Duration => MAX_DURATION_MS as u64,
            Self::Velocity => MAX_VELOCITY as u64,
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartTime => "start time",
            Self::Frequency => "frequency",
            Self::Duration => "duration",
            Self::Velocity => "velocity",
        };
        f.write_str(name)
    }
}

/// A derived value does not fit its record field.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, thiserror::Error)]
#[error("{field} overflow: {value} exceeds {max}")]
pub struct FieldOverflow {
    pub field: RecordField,
    pub value: u64,
    pub max: u64,
}

/// What to do with a note whose fields do not fit.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Keep the record with every overflowing field set to its maximum.
    #[default]
    Clamp,
    /// Drop the record.
    Skip,
}

impl NoteRecord {
    // values are truncated toward zero like the device table expects
    fn raw_fields(note: &Note) -> [(RecordField, u64); 4] {
        [
            (RecordField::StartTime, truncate(note.start_time * 1000.0)),
            (RecordField::Frequency, truncate(note.frequency)),
            (RecordField::Duration, truncate(note.duration_ms)),
            (RecordField::Velocity, u64::from(note.velocity)),
        ]
    }

    /// Every field of `note` that does not fit.
    pub fn overflows(note: &Note) -> Vec<FieldOverflow> {
        Self::raw_fields(note)
            .into_iter()
            .filter(|(field, value)| *value > field.max())
            .map(|(field, value)| FieldOverflow {
                field,
                value,
                max: field.max(),
            })
            .collect()
    }

    /// Record with overflowing fields saturated.
    pub fn clamped(note: &Note) -> Self {
        let [start_time_ms, frequency_hz, duration_ms, velocity] =
            Self::raw_fields(note).map(|(field, value)| value.min(field.max()));
        Self {
            start_time_ms: start_time_ms as u32,
            frequency_hz: frequency_hz as u16,
            duration_ms: duration_ms as u16,
            velocity: velocity as u8,
        }
    }
}

impl TryFrom<&Note> for NoteRecord {
    type Error = FieldOverflow;

    fn try_from(note: &Note) -> Result<Self, Self::Error> {
        match Self::overflows(note).first() {
            Some(overflow) => Err(*overflow),
            None => Ok(Self::clamped(note)),
        }
    }
}

fn truncate(value: f64) -> u64 {
    // saturating, NaN becomes 0
    value.max(0.0).trunc() as u64
}

/// Overflow of the note at `note_index` in its track.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct NoteOverflow {
    pub note_index: usize,
    #[serde(flatten)]
    pub overflow: FieldOverflow,
}

/// Records of one track plus the diagnostics gathered on the way.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct EncodedTrack {
    pub records: Vec<NoteRecord>,
    pub overflows: Vec<NoteOverflow>,
    pub unclosed_notes: usize,
}

/// Encodes the notes of a track, applying `policy` to notes that do not fit.
pub fn encode_track(track: &TrackNotes, policy: OverflowPolicy) -> EncodedTrack {
    let mut encoded = EncodedTrack {
        records: Vec::with_capacity(track.notes.len()),
        overflows: Vec::new(),
        unclosed_notes: track.unclosed,
    };
    for (note_index, note) in track.notes.iter().enumerate() {
        let overflows = NoteRecord::overflows(note);
        if overflows.is_empty() || policy == OverflowPolicy::Clamp {
            encoded.records.push(NoteRecord::clamped(note));
        }
        for overflow in overflows {
            log::warn!("note {note_index}: {overflow} ({policy:?})");
            encoded.overflows.push(NoteOverflow {
                note_index,
                overflow,
            });
        }
    }
    encoded
}
