//! Midisquare - MIDI to square-wave notes
//!
//! This library provides:
//! - Tempo-aware decoding of MIDI tracks into absolute time
//! - Note extraction and fixed-width note records for device tables
//! - Live square-wave playback: a real-time scheduler and a render callback
//!
//! # Example
//!
//! ```no_run
//! use midisquare::{encode_track, extract_notes, load_smf, OverflowPolicy};
//!
//! let file_data = std::fs::read("song.mid").unwrap();
//! let file = load_smf(&file_data).unwrap();
//! for track in extract_notes(&file).unwrap() {
//!     let encoded = encode_track(&track, OverflowPolicy::Clamp);
//!     println!("{} records", encoded.records.len());
//! }
//! ```

pub mod audio;
pub mod error;
pub mod midi;
pub mod table;

// Re-export main types for convenience
pub use audio::{
    active_notes::{ActiveNotes, PitchSet},
    live_scheduler::{
        Clock, LiveScheduler, PlaybackOutcome, SchedulerHandle, SchedulerState, StopToken,
        SystemClock, DEFAULT_SETTLE_DELAY,
    },
    square_synth::{RenderSource, SquareSynth, SynthSource, DEFAULT_AMPLITUDE, SAMPLE_RATE},
};
pub use error::MidiError;
pub use midi::{
    event_decoder::{decode_merged, decode_tracks, ScheduledEvent, TimedMessage},
    midi_event::{MessageKind, MidiFile, MidiMessage, MidiTrack},
    note_extractor::{extract_notes, pitch_to_frequency, Note, NoteExtractor, TrackNotes},
    smf_loader::load_smf,
    tick_clock::{elapsed_seconds, DEFAULT_TEMPO},
};
pub use table::note_record::{
    encode_track, EncodedTrack, FieldOverflow, NoteRecord, OverflowPolicy, RecordField,
};
