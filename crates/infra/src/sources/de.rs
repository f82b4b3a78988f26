//! Lenient field deserializers shared by the platform DTOs.
//!
//! Exported payloads come from scrapers and API dumps that disagree on small
//! things: ids as numbers or strings, counts as strings, authors as plain names
//! or profile objects, lists wrapped in GraphQL connections. These helpers
//! absorb those differences so a shape only fails on a missing required field.

use serde::de::{Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Int(i64),
    UInt(u64),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            IdValue::Text(value) => value.trim().to_string(),
            IdValue::Int(value) => value.to_string(),
            IdValue::UInt(value) => value.to_string(),
        }
    }
}

pub(crate) fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IdValue>::deserialize(deserializer)?;
    Ok(raw.map(IdValue::into_string).filter(|id| !id.is_empty()))
}

pub(crate) fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    flexible_id(deserializer)?.ok_or_else(|| D::Error::custom("empty id"))
}

pub(crate) fn id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids: Vec<IdValue> = lenient_list(deserializer)?;
    Ok(ids
        .into_iter()
        .map(IdValue::into_string)
        .filter(|id| !id.is_empty())
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountValue {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Counts and scores: integers, floats, or numeric strings. Anything else is absent.
pub(crate) fn flexible_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<CountValue>::deserialize(deserializer)?;
    Ok(match raw {
        Some(CountValue::Int(value)) => Some(value),
        Some(CountValue::Float(value)) if value.is_finite() => Some(value.round() as i64),
        Some(CountValue::Text(value)) => value.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListValue<T> {
    List(Vec<T>),
    Connection { nodes: Vec<T> },
    Other(IgnoredAny),
}

/// A JSON array, a GraphQL `{ "nodes": [...] }` connection, or anything else
/// (an empty string, a count) read as no items.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<ListValue<T>>::deserialize(deserializer)? {
        Some(ListValue::List(items)) | Some(ListValue::Connection { nodes: items }) => items,
        _ => Vec::new(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AuthorValue {
    Name(String),
    Profile {
        #[serde(default)]
        login: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        username: Option<String>,
    },
    Other(IgnoredAny),
}

/// An author given as a name or as a profile object with a login.
pub(crate) fn author_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = match Option::<AuthorValue>::deserialize(deserializer)? {
        Some(AuthorValue::Name(name)) => Some(name),
        Some(AuthorValue::Profile {
            login,
            name,
            username,
        }) => login.or(username).or(name),
        _ => None,
    };
    Ok(name.map(|name| name.trim().to_string()).filter(|name| !name.is_empty()))
}

/// Labels and tags: plain strings or objects carrying a `name`.
pub(crate) fn name_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Named {
        Text(String),
        Object { name: String },
        Other(IgnoredAny),
    }

    let items: Vec<Named> = lenient_list(deserializer)?;
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Named::Text(name) | Named::Object { name } => Some(name.trim().to_string()),
            Named::Other(_) => None,
        })
        .filter(|name| !name.is_empty())
        .collect())
}
