pub mod comments;
pub mod minified;
