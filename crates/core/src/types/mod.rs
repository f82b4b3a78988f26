pub mod source_kind;
pub mod timestamp;
