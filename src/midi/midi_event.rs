/// A decoded MIDI file, independent of the container format it came from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MidiFile {
    /// Tick resolution, must be positive to be decodable.
    pub ticks_per_beat: i32,
    /// Tracks in file order.
    pub tracks: Vec<MidiTrack>,
}

impl MidiFile {
    pub const fn new(ticks_per_beat: i32, tracks: Vec<MidiTrack>) -> Self {
        Self {
            ticks_per_beat,
            tracks,
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MidiTrack {
    pub messages: Vec<MidiMessage>,
}

impl MidiTrack {
    pub const fn new(messages: Vec<MidiMessage>) -> Self {
        Self { messages }
    }
}

impl FromIterator<MidiMessage> for MidiTrack {
    fn from_iter<I: IntoIterator<Item = MidiMessage>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MidiMessage {
    /// Ticks elapsed since the previous message of the same track.
    pub delta_ticks: u32,
    /// The payload of the message.
    pub kind: MessageKind,
}

impl MidiMessage {
    pub const fn new_note_on(delta_ticks: u32, pitch: u8, velocity: u8) -> Self {
        Self {
            delta_ticks,
            kind: MessageKind::NoteOn { pitch, velocity },
        }
    }

    pub const fn new_note_off(delta_ticks: u32, pitch: u8) -> Self {
        Self {
            delta_ticks,
            kind: MessageKind::NoteOff { pitch },
        }
    }

    pub const fn new_tempo_change(delta_ticks: u32, us_per_quarter: u32) -> Self {
        Self {
            delta_ticks,
            kind: MessageKind::TempoChange(us_per_quarter),
        }
    }

    pub const fn new_other(delta_ticks: u32) -> Self {
        Self {
            delta_ticks,
            kind: MessageKind::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MessageKind {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    TempoChange(u32), // microseconds per quarter note
    Other,
}

impl MessageKind {
    pub const fn is_tempo_change(&self) -> bool {
        matches!(self, Self::TempoChange(_))
    }

    /// Pitch and velocity of a note-on that starts a note.
    pub const fn note_start(&self) -> Option<(u8, u8)> {
        match *self {
            Self::NoteOn { pitch, velocity } if velocity > 0 => Some((pitch, velocity)),
            _ => None,
        }
    }

    /// Pitch released by a note-off or a zero velocity note-on.
    pub const fn note_release(&self) -> Option<u8> {
        match *self {
            Self::NoteOff { pitch } | Self::NoteOn { pitch, velocity: 0 } => Some(pitch),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_velocity_note_on_is_release() {
        let kind = MidiMessage::new_note_on(0, 60, 0).kind;
        assert_eq!(kind.note_start(), None);
        assert_eq!(kind.note_release(), Some(60));
    }

    #[test]
    fn test_note_on_is_start() {
        let kind = MidiMessage::new_note_on(0, 64, 90).kind;
        assert_eq!(kind.note_start(), Some((64, 90)));
        assert_eq!(kind.note_release(), None);
    }

    #[test]
    fn test_other_messages_are_not_notes() {
        for kind in [MessageKind::Other, MessageKind::TempoChange(400_000)] {
            assert_eq!(kind.note_start(), None);
            assert_eq!(kind.note_release(), None);
        }
        assert!(MessageKind::TempoChange(1).is_tempo_change());
    }
}
