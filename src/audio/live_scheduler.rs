use crate::audio::active_notes::ActiveNotes;
use crate::error::MidiError;
use crate::midi::event_decoder::{decode_merged, ScheduledEvent};
use crate::midi::midi_event::MidiFile;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Lets the audio stream render silence before the first note.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SchedulerState {
    Idle,
    Running,
    Draining,
    Stopped,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PlaybackOutcome {
    /// Every event was applied.
    Completed,
    /// Stopped before the end, active notes were cleared.
    Cancelled,
}

/// Time source of the scheduler.
pub trait Clock: Send + 'static {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Cooperative cancellation, checked between events.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Plays the merged events of a file into an [`ActiveNotes`] set, in real time.
pub struct LiveScheduler<C: Clock = SystemClock> {
    events: Vec<ScheduledEvent>, // sorted by time
    active: ActiveNotes,
    settle_delay: Duration,
    clock: C,
    stop: StopToken,
    state: watch::Sender<SchedulerState>,
}

impl LiveScheduler<SystemClock> {
    /// Decodes `file` up front so malformed input fails before playback.
    pub fn new(
        file: &MidiFile,
        active: ActiveNotes,
        settle_delay: Duration,
    ) -> Result<Self, MidiError> {
        let events = decode_merged(file)?;
        Ok(Self::with_clock(events, active, settle_delay, SystemClock))
    }
}

impl<C: Clock> LiveScheduler<C> {
    pub fn with_clock(
        events: Vec<ScheduledEvent>,
        active: ActiveNotes,
        settle_delay: Duration,
        clock: C,
    ) -> Self {
        assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            events,
            active,
            settle_delay,
            clock,
            stop: StopToken::new(),
            state,
        }
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Plays on a dedicated thread.
    pub fn start(self) -> Result<SchedulerHandle, MidiError> {
        let stop = self.stop_token();
        let state = self.subscribe();
        let thread = std::thread::Builder::new()
            .name("midi-scheduler".to_string())
            .spawn(move || self.run())
            .map_err(|err| MidiError::AudioError(format!("Could not start scheduler {err}")))?;
        Ok(SchedulerHandle {
            thread,
            stop,
            state,
        })
    }

    /// Plays on the calling thread until the last event or a stop request.
    pub fn run(self) -> PlaybackOutcome {
        self.set_state(SchedulerState::Running);
        log::info!("Playing {} events", self.events.len());
        self.clock.sleep(self.settle_delay);
        let start = self.clock.now();

        for event in &self.events {
            if self.stop.is_stopped() {
                return self.cancel();
            }
            let target = start + Duration::from_secs_f64(event.time);
            let now = self.clock.now();
            if target > now {
                self.clock.sleep(target - now);
            }
            if self.stop.is_stopped() {
                return self.cancel();
            }
            self.apply(event);
        }

        self.set_state(SchedulerState::Draining);
        log::info!("Playback finished");
        self.set_state(SchedulerState::Stopped);
        PlaybackOutcome::Completed
    }

    fn apply(&self, event: &ScheduledEvent) {
        if let Some((pitch, velocity)) = event.message.note_start() {
            log::debug!(
                "Note on: pitch={pitch}, velocity={velocity}, track={}",
                event.track
            );
            self.active.note_on(pitch);
        } else if let Some(pitch) = event.message.note_release() {
            log::debug!("Note off: pitch={pitch}, track={}", event.track);
            self.active.note_off(pitch);
        }
    }

    fn cancel(&self) -> PlaybackOutcome {
        log::info!("Playback cancelled");
        self.active.clear();
        self.set_state(SchedulerState::Stopped);
        PlaybackOutcome::Cancelled
    }

    fn set_state(&self, state: SchedulerState) {
        log::debug!("Scheduler state {state:?}");
        self.state.send_replace(state);
    }
}

/// Running scheduler thread.
pub struct SchedulerHandle {
    thread: JoinHandle<PlaybackOutcome>,
    stop: StopToken,
    state: watch::Receiver<SchedulerState>,
}

impl SchedulerHandle {
    /// Requests a stop, effective before the next event is applied.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) -> Result<PlaybackOutcome, MidiError> {
        self.thread
            .join()
            .map_err(|_| MidiError::AudioError("Scheduler thread panicked".to_string()))
    }
}
