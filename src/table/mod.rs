pub mod note_record;
