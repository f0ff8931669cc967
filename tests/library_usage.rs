//! Integration tests for midisquare library usage.
//!
//! These tests verify that the library can be used as a dependency
//! from external projects.

use midisquare::{
    decode_merged, elapsed_seconds, encode_track, extract_notes, load_smf, ActiveNotes,
    LiveScheduler, MessageKind, MidiError, MidiFile, MidiMessage, MidiTrack, OverflowPolicy,
    PlaybackOutcome, RenderSource, SchedulerState, SquareSynth, SynthSource, DEFAULT_AMPLITUDE,
    DEFAULT_TEMPO, SAMPLE_RATE,
};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::time::Duration;

/// Test that all major types are accessible from the library.
#[test]
fn test_types_accessible() {
    // This test verifies that the public API types compile and are usable.
    // If any re-export is missing, this test will fail to compile.

    fn _assert_types() {
        let _: fn(&[u8]) -> Result<MidiFile, MidiError> = load_smf;
        let _: fn(u32, u32, u32) -> f64 = elapsed_seconds;
        let _: u32 = DEFAULT_TEMPO;
        let _: u32 = SAMPLE_RATE;
    }
}

fn track_event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind,
    }
}

fn note(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
    track_event(
        delta,
        TrackEventKind::Midi {
            channel: u4::new(0),
            message: midly::MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        },
    )
}

/// Two tracks at 480 ticks per beat: a conductor track slowing down after one beat,
/// and a melody of two quarter notes.
fn demo_song_bytes() -> Vec<u8> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(480)),
    ));
    smf.tracks.push(vec![
        track_event(480, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(1_000_000)))),
        track_event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ]);
    smf.tracks.push(vec![
        note(0, 60, 100),
        note(480, 60, 0),
        note(0, 64, 80),
        note(480, 64, 0),
        note(0, 67, 70),
        track_event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ]);
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).expect("Failed to write MIDI file");
    bytes
}

/// Test the offline path from raw bytes to note records.
#[test]
fn test_convert_to_records() {
    let file = load_smf(&demo_song_bytes()).expect("Failed to load MIDI file");
    let tracks = extract_notes(&file).expect("Failed to extract notes");
    assert_eq!(tracks.len(), 2);
    assert!(tracks[0].notes.is_empty());

    // melody track keeps its own default tempo
    let encoded = encode_track(&tracks[1], OverflowPolicy::Clamp);
    assert_eq!(encoded.records.len(), 2);
    assert_eq!(encoded.records[0].start_time_ms, 0);
    assert_eq!(encoded.records[0].frequency_hz, 261);
    assert_eq!(encoded.records[0].duration_ms, 500);
    assert_eq!(encoded.records[0].velocity, 100);
    assert_eq!(encoded.records[1].start_time_ms, 500);
    assert_eq!(encoded.records[1].frequency_hz, 329);
    assert_eq!(encoded.records[1].duration_ms, 500);
    assert_eq!(encoded.unclosed_notes, 1);
    assert!(encoded.overflows.is_empty());
}

/// Test that the merged path shares the conductor tempo.
#[test]
fn test_merged_sequence_uses_shared_tempo() {
    let file = load_smf(&demo_song_bytes()).expect("Failed to load MIDI file");
    let events = decode_merged(&file).expect("Failed to decode");
    let release = events
        .iter()
        .filter(|event| event.message == MessageKind::NoteOn { pitch: 64, velocity: 0 })
        .map(|event| event.time)
        .next()
        .expect("missing release");
    // one beat at 120 BPM then one beat at 60 BPM
    assert!((release - 1.5).abs() < 1e-9);
}

/// Test error handling for invalid data.
#[test]
fn test_malformed_tempo_error() {
    let file = MidiFile::new(0, vec![MidiTrack::new(vec![MidiMessage::new_other(0)])]);
    let result = extract_notes(&file);
    assert!(
        matches!(result, Err(MidiError::MalformedTempo(0))),
        "Should be a MalformedTempo error"
    );
}

/// Test live playback without an audio device.
#[test]
fn test_live_playback_with_injected_render_source() {
    let file = MidiFile::new(
        480,
        vec![MidiTrack::new(vec![
            MidiMessage::new_note_on(0, 69, 100),
            MidiMessage::new_note_off(24, 69),
        ])],
    );
    let active = ActiveNotes::new();
    let scheduler =
        LiveScheduler::new(&file, active.clone(), Duration::ZERO).expect("Failed to schedule");
    let state = scheduler.subscribe();
    let mut source = SynthSource::new(SquareSynth::new(
        active.clone(),
        SAMPLE_RATE,
        DEFAULT_AMPLITUDE,
    ));

    let handle = scheduler.start().expect("Failed to start scheduler");
    let outcome = handle.join().expect("Scheduler panicked");
    assert_eq!(outcome, PlaybackOutcome::Completed);
    assert_eq!(*state.borrow(), SchedulerState::Stopped);

    // everything released: the next buffer is silent
    let mut buffer = vec![1.0_f32; 512];
    source.render(&mut buffer);
    assert!(buffer.iter().all(|sample| *sample == 0.0));
}
