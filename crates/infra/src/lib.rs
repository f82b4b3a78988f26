pub mod dispatch;
pub mod prepare;
pub mod sources;

pub use dispatch::{
    AUTO_HINT, PayloadError, SourcePayload, detect_payload, dispatch, dispatch_json, parse_payload,
};
pub use prepare::{prepare, prepare_json};
