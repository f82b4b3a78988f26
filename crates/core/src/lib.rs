pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod hierarchy;
pub mod render;
pub mod sanitize;
pub mod types;

pub use diagnostics::{ConvertContext, DebugSink};
pub use domain::minified::{MinifiedCommentNode, MinifiedCommentThread, minify, minify_all};
pub use domain::comments::{
    CommentNode, CommentThread, Metadata, UNKNOWN_AUTHOR, author_or_unknown, collect_metadata,
};
pub use error::CoreError;
pub use hierarchy::{Forest, ORPHAN_MARKER, build_forest, mark_orphans};
pub use render::{DEFAULT_MAX_COMMENTS, PrepareOptions, PreparedText, minify_text, render_budgeted};
pub use sanitize::{decode_entities, sanitize, sanitize_inline};
pub use types::source_kind::SourceKind;
pub use types::timestamp::Timestamp;
