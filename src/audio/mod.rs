pub mod active_notes;
pub mod live_scheduler;
pub mod square_synth;
