//! Adapter from `midly` standard MIDI files to [`MidiFile`].

use crate::error::MidiError;
use crate::midi::midi_event::{MessageKind, MidiFile, MidiMessage, MidiTrack};
use midly::{MetaMessage, Smf, Timing, TrackEvent, TrackEventKind};

/// Parses raw standard MIDI file bytes.
pub fn load_smf(data: &[u8]) -> Result<MidiFile, MidiError> {
    let smf = Smf::parse(data)?;
    from_smf(&smf)
}

/// Converts an already parsed file.
pub fn from_smf(smf: &Smf) -> Result<MidiFile, MidiError> {
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(ticks) => i32::from(ticks.as_int()),
        Timing::Timecode(fps, subframe) => {
            return Err(MidiError::ParsingError(format!(
                "timecode timing is not supported ({fps:?}, {subframe} subframes)"
            )))
        }
    };
    let tracks: Vec<MidiTrack> = smf
        .tracks
        .iter()
        .map(|track| track.iter().map(convert_event).collect())
        .collect();
    log::debug!(
        "loaded {} tracks at {ticks_per_beat} ticks per beat",
        tracks.len()
    );
    Ok(MidiFile::new(ticks_per_beat, tracks))
}

fn convert_event(event: &TrackEvent) -> MidiMessage {
    let kind = match event.kind {
        TrackEventKind::Midi { message, .. } => match message {
            midly::MidiMessage::NoteOn { key, vel } => MessageKind::NoteOn {
                pitch: key.as_int(),
                velocity: vel.as_int(),
            },
            midly::MidiMessage::NoteOff { key, .. } => MessageKind::NoteOff {
                pitch: key.as_int(),
            },
            _ => MessageKind::Other,
        },
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => MessageKind::TempoChange(tempo.as_int()),
        _ => MessageKind::Other,
    };
    MidiMessage {
        delta_ticks: event.delta.as_int(),
        kind,
    }
}
