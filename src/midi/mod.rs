pub mod event_decoder;
pub mod midi_event;
pub mod note_extractor;
pub mod smf_loader;
pub mod tick_clock;
