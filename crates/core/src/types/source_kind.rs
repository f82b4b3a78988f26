use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    YouTube,
    Reddit,
    GitHub,
    HackerNews,
    Twitter,
    Blog,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::YouTube,
        SourceKind::Reddit,
        SourceKind::GitHub,
        SourceKind::HackerNews,
        SourceKind::Twitter,
        SourceKind::Blog,
    ];

    /// Human-readable label used in rendered headers and serialized threads.
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::YouTube => "YouTube",
            SourceKind::Reddit => "Reddit",
            SourceKind::GitHub => "GitHub",
            SourceKind::HackerNews => "HackerNews",
            SourceKind::Twitter => "Twitter",
            SourceKind::Blog => "Blog",
        }
    }

    /// Lower-cased type hint accepted by the JSON dispatcher.
    pub fn hint(self) -> &'static str {
        match self {
            SourceKind::YouTube => "youtube",
            SourceKind::Reddit => "reddit",
            SourceKind::GitHub => "github",
            SourceKind::HackerNews => "hackernews",
            SourceKind::Twitter => "twitter",
            SourceKind::Blog => "blog",
        }
    }
}

impl FromStr for SourceKind {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hint = value.trim().to_ascii_lowercase();
        match hint.as_str() {
            "youtube" | "yt" => Ok(SourceKind::YouTube),
            "reddit" => Ok(SourceKind::Reddit),
            "github" | "gh" => Ok(SourceKind::GitHub),
            "hackernews" | "hacker_news" | "hn" => Ok(SourceKind::HackerNews),
            "twitter" | "x" => Ok(SourceKind::Twitter),
            "blog" | "medium" | "disqus" => Ok(SourceKind::Blog),
            _ => Err(CoreError::UnknownSource(value.trim().to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for SourceKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}
