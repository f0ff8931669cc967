//! Turns delta-timed track messages into absolute time.
//!
//! Two modes share [`decode_stream`]:
//! - per track, each track owning its tempo (offline conversion)
//! - merged, all tracks interleaved and sharing one tempo (live playback)

use crate::error::MidiError;
use crate::midi::midi_event::{MessageKind, MidiFile, MidiMessage, MidiTrack};
use crate::midi::tick_clock::{validate_ticks_per_beat, TickClock};

/// A message of a single track at its absolute time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMessage {
    /// Seconds since the start of the track.
    pub time: f64,
    pub message: MessageKind,
}

/// A message of the merged sequence at its absolute time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Seconds since the start of the song.
    pub time: f64,
    /// Index of the track the message comes from.
    pub track: usize,
    pub message: MessageKind,
}

/// Core decode loop: advances the clock by each delta *before* applying a tempo change,
/// so a new tempo only affects the deltas that follow it.
fn decode_stream<I, F>(ticks_per_beat: u32, messages: I, mut visit: F)
where
    I: IntoIterator<Item = (usize, MidiMessage)>,
    F: FnMut(f64, usize, MessageKind),
{
    let mut clock = TickClock::new(ticks_per_beat);
    for (track, message) in messages {
        let time = clock.advance(message.delta_ticks);
        if let MessageKind::TempoChange(tempo) = message.kind {
            clock.set_tempo(tempo);
        }
        visit(time, track, message.kind);
    }
}

/// Decodes every track independently, each starting at the default tempo.
///
/// Tempo changes are consumed by the track they belong to and not forwarded.
pub fn decode_tracks(file: &MidiFile) -> Result<Vec<Vec<TimedMessage>>, MidiError> {
    let ticks_per_beat = validate_ticks_per_beat(file.ticks_per_beat)?;
    let decoded = file
        .tracks
        .iter()
        .enumerate()
        .map(|(track_id, track)| {
            let mut timed = Vec::with_capacity(track.messages.len());
            decode_stream(
                ticks_per_beat,
                track.messages.iter().map(|message| (track_id, *message)),
                |time, _, message| {
                    if !message.is_tempo_change() {
                        timed.push(TimedMessage { time, message });
                    }
                },
            );
            log::debug!(
                "decoded {} messages for track {track_id}",
                track.messages.len()
            );
            timed
        })
        .collect();
    Ok(decoded)
}

/// Decodes all tracks as a single time-ordered sequence sharing one tempo.
pub fn decode_merged(file: &MidiFile) -> Result<Vec<ScheduledEvent>, MidiError> {
    let ticks_per_beat = validate_ticks_per_beat(file.ticks_per_beat)?;
    let merged = merge_tracks(&file.tracks);
    let mut events = Vec::with_capacity(merged.len());
    decode_stream(ticks_per_beat, merged, |time, track, message| {
        events.push(ScheduledEvent {
            time,
            track,
            message,
        });
    });
    log::debug!(
        "merged {} tracks into {} events",
        file.tracks.len(),
        events.len()
    );
    Ok(events)
}

/// Interleaves tracks by absolute tick and re-expresses deltas against the merged order.
///
/// Messages on the same tick keep track order, then in-track order.
pub fn merge_tracks(tracks: &[MidiTrack]) -> Vec<(usize, MidiMessage)> {
    let total = tracks.iter().map(|track| track.messages.len()).sum();
    let mut absolute: Vec<(u64, usize, MidiMessage)> = Vec::with_capacity(total);
    for (track_id, track) in tracks.iter().enumerate() {
        let mut tick = 0_u64;
        for message in &track.messages {
            tick += u64::from(message.delta_ticks);
            absolute.push((tick, track_id, *message));
        }
    }
    // stable sort, ties stay in push order
    absolute.sort_by_key(|(tick, _, _)| *tick);

    let mut previous_tick = 0_u64;
    absolute
        .into_iter()
        .map(|(tick, track_id, message)| {
            // never larger than the message's own delta
            let delta_ticks = u32::try_from(tick - previous_tick).unwrap_or(u32::MAX);
            previous_tick = tick;
            (
                track_id,
                MidiMessage {
                    delta_ticks,
                    ..message
                },
            )
        })
        .collect()
}
