use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Number of addressable MIDI pitches.
pub const PITCH_COUNT: usize = 128;

/// Fixed-size set of MIDI pitches.
///
/// `Copy` so a snapshot never allocates.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct PitchSet {
    bits: [u64; 2],
}

impl PitchSet {
    pub const fn new() -> Self {
        Self { bits: [0; 2] }
    }

    const fn slot(pitch: u8) -> (usize, u64) {
        ((pitch as usize / 64) & 1, 1_u64 << (pitch % 64))
    }

    /// Returns `false` if the pitch was already present or is out of range.
    pub fn insert(&mut self, pitch: u8) -> bool {
        if usize::from(pitch) >= PITCH_COUNT || self.contains(pitch) {
            return false;
        }
        let (word, mask) = Self::slot(pitch);
        self.bits[word] |= mask;
        true
    }

    /// Returns `false` if the pitch was not present.
    pub fn remove(&mut self, pitch: u8) -> bool {
        if !self.contains(pitch) {
            return false;
        }
        let (word, mask) = Self::slot(pitch);
        self.bits[word] &= !mask;
        true
    }

    pub const fn contains(&self, pitch: u8) -> bool {
        if pitch as usize >= PITCH_COUNT {
            return false;
        }
        let (word, mask) = Self::slot(pitch);
        self.bits[word] & mask != 0
    }

    pub const fn len(&self) -> usize {
        (self.bits[0].count_ones() + self.bits[1].count_ones()) as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.bits[0] == 0 && self.bits[1] == 0
    }

    #[allow(clippy::missing_const_for_fn)]
    pub fn clear(&mut self) {
        self.bits = [0; 2];
    }

    /// Pitches in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..PITCH_COUNT as u8).filter(|pitch| self.contains(*pitch))
    }
}

/// Shared handle to the currently sounding pitches.
///
/// The lock is only held to copy or mutate the set.
#[derive(Debug, Clone, Default)]
pub struct ActiveNotes {
    pitches: Arc<Mutex<PitchSet>>,
}

impl ActiveNotes {
    pub fn new() -> Self {
        Self::default()
    }

    // a panicking holder cannot leave the set half-updated
    fn lock(&self) -> MutexGuard<'_, PitchSet> {
        self.pitches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the set consistent at a single instant.
    pub fn snapshot(&self) -> PitchSet {
        *self.lock()
    }

    pub fn note_on(&self, pitch: u8) -> bool {
        self.lock().insert(pitch)
    }

    pub fn note_off(&self, pitch: u8) -> bool {
        self.lock().remove(pitch)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_set_insert_remove() {
        let mut set = PitchSet::new();
        assert!(set.is_empty());
        assert!(set.insert(60));
        assert!(!set.insert(60));
        assert!(set.insert(0));
        assert!(set.insert(127));
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 60, 127]);
        assert!(set.remove(60));
        assert!(!set.remove(60));
        assert_eq!(set.len(), 2);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_pitch_set_ignores_out_of_range() {
        let mut set = PitchSet::new();
        assert!(!set.insert(128));
        assert!(!set.insert(200));
        assert!(!set.contains(200));
        assert!(set.is_empty());
    }

    #[test]
    fn test_handles_share_state() {
        let writer = ActiveNotes::new();
        let reader = writer.clone();
        writer.note_on(64);
        writer.note_on(67);
        let snapshot = reader.snapshot();
        writer.note_off(64);
        // snapshot is detached from later updates
        assert!(snapshot.contains(64));
        assert!(!reader.snapshot().contains(64));
        assert!(reader.snapshot().contains(67));
        writer.clear();
        assert!(reader.snapshot().is_empty());
    }
}
