//! Row shapes the gateway writes.
//!
//! Each write type is validated on construction and turned into a provider [`Row`]
//! with only the columns the gateway owns. Every type carries the acting owner's
//! `user_id`; callers run the ownership guard before building one.

use core::str::FromStr;

use serde_json::Value;

use crate::error::{DomainError, DomainResult};
use crate::id::{RecordId, UserId};
use crate::table::Row;

/// Require a present, non-blank text field.
pub fn require_text(field: &'static str, value: Option<String>) -> DomainResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DomainError::MissingField(field)),
    }
}

/// Require a present identifier field that parses.
pub fn require_id<T>(field: &'static str, value: Option<String>) -> DomainResult<T>
where
    T: FromStr<Err = DomainError>,
{
    let raw = require_text(field, value)?;
    raw.parse::<T>()
        .map_err(|e| DomainError::invalid_id(format!("{field}: {e}")))
}

/// Parse an optional identifier filter. Absent and blank are both "no filter".
pub fn optional_id<T>(field: &'static str, value: Option<String>) -> DomainResult<Option<T>>
where
    T: FromStr<Err = DomainError>,
{
    match value {
        Some(v) if !v.trim().is_empty() => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| DomainError::invalid_id(format!("{field}: {e}"))),
        _ => Ok(None),
    }
}

fn text(v: impl Into<String>) -> Value {
    Value::String(v.into())
}

fn id(v: impl ToString) -> Value {
    Value::String(v.to_string())
}

fn nullable(v: Option<String>) -> Value {
    v.map(Value::String).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub user_id: UserId,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl NewProfile {
    pub fn into_row(self) -> Row {
        let mut row = Row::new();
        row.insert("user_id".into(), id(self.user_id));
        row.insert("username".into(), text(self.username));
        row.insert("bio".into(), nullable(self.bio));
        row.insert("avatar_url".into(), nullable(self.avatar_url));
        row
    }
}

/// Sparse profile update: only supplied fields are written, nothing is nulled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    username: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
}

impl ProfilePatch {
    /// A supplied username must not be blank; `bio`/`avatar_url` may be set to "".
    pub fn new(
        username: Option<String>,
        bio: Option<String>,
        avatar_url: Option<String>,
    ) -> DomainResult<Self> {
        if let Some(name) = &username {
            if name.trim().is_empty() {
                return Err(DomainError::validation("username must not be blank"));
            }
        }
        Ok(Self {
            username,
            bio,
            avatar_url,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn into_row(self) -> Row {
        let mut row = Row::new();
        if let Some(v) = self.username {
            row.insert("username".into(), text(v));
        }
        if let Some(v) = self.bio {
            row.insert("bio".into(), text(v));
        }
        if let Some(v) = self.avatar_url {
            row.insert("avatar_url".into(), text(v));
        }
        row
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCall {
    pub user_id: UserId,
    pub prompt: String,
}

impl NewCall {
    pub fn into_row(self) -> Row {
        let mut row = Row::new();
        row.insert("user_id".into(), id(self.user_id));
        row.insert("prompt".into(), text(self.prompt));
        row
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
    pub call_id: RecordId,
    pub user_id: UserId,
    pub response_text: String,
}

impl NewResponse {
    pub fn into_row(self) -> Row {
        let mut row = Row::new();
        row.insert("call_id".into(), id(self.call_id));
        row.insert("user_id".into(), id(self.user_id));
        row.insert("response_text".into(), text(self.response_text));
        row
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEcho {
    pub call_id: RecordId,
    pub response_id: RecordId,
    pub user_id: UserId,
}

impl NewEcho {
    pub fn into_row(self) -> Row {
        let mut row = Row::new();
        row.insert("call_id".into(), id(self.call_id));
        row.insert("response_id".into(), id(self.response_id));
        row.insert("user_id".into(), id(self.user_id));
        row
    }
}

/// Key of a toggle relation (amplify / bookmark): one row per `(call_id, user_id)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RelationKey {
    pub call_id: RecordId,
    pub user_id: UserId,
}

impl RelationKey {
    pub fn into_row(self) -> Row {
        let mut row = Row::new();
        row.insert("call_id".into(), id(self.call_id));
        row.insert("user_id".into(), id(self.user_id));
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_missing() {
        assert_eq!(
            require_text("prompt", Some("   ".into())),
            Err(DomainError::MissingField("prompt"))
        );
        assert_eq!(require_text("prompt", None), Err(DomainError::MissingField("prompt")));
        assert_eq!(require_text("prompt", Some("hi".into())).unwrap(), "hi");
    }

    #[test]
    fn ids_are_parsed_and_named() {
        let call = RecordId::new();
        let parsed: RecordId = require_id("call_id", Some(call.to_string())).unwrap();
        assert_eq!(parsed, call);

        let err = require_id::<RecordId>("call_id", Some("nope".into())).unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(msg) if msg.starts_with("call_id")));

        assert_eq!(optional_id::<RecordId>("call_id", Some("".into())).unwrap(), None);
    }

    #[test]
    fn patch_only_writes_supplied_fields() {
        let patch = ProfilePatch::new(None, Some("new bio".into()), None).unwrap();
        assert!(!patch.is_empty());
        let row = patch.into_row();
        assert_eq!(row.len(), 1);
        assert_eq!(row["bio"], "new bio");
    }

    #[test]
    fn empty_patch_and_blank_username() {
        assert!(ProfilePatch::new(None, None, None).unwrap().is_empty());
        assert!(ProfilePatch::new(Some(" ".into()), None, None).is_err());
    }

    #[test]
    fn new_profile_row_nulls_unset_optionals() {
        let user_id = UserId::new();
        let row = NewProfile {
            user_id,
            username: "ada".into(),
            bio: None,
            avatar_url: Some("https://img/ada.png".into()),
        }
        .into_row();

        assert_eq!(row["user_id"], user_id.to_string());
        assert!(row["bio"].is_null());
        assert_eq!(row["avatar_url"], "https://img/ada.png");
    }
}
