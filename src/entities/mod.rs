pub mod draw_records;
pub mod participants;
pub mod prizes;

pub use draw_records as draw_record_entity;
pub use participants as participant_entity;
pub use prizes as prize_entity;
