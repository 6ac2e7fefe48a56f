//! Attribution carried by every mutation: who acted, when, and the append-only edit history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in identity supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            email: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn email_or_empty(&self) -> String {
        self.email.clone().unwrap_or_default()
    }

    /// Human readable attribution. Falls back to a name derived from the e-mail local part so
    /// full addresses never surface in timelines.
    pub fn label(&self) -> String {
        if let Some(name) = self.display_name.as_deref() {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
        label_from_email(self.email.as_deref())
    }
}

/// `asha.k_rao@clinic.in` becomes `Asha K Rao`.
pub fn label_from_email(email: Option<&str>) -> String {
    let local = email
        .and_then(|value| value.split('@').next())
        .unwrap_or_default();
    let words: Vec<String> = local
        .split(['_', '.', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Unknown".to_string()
    } else {
        words.join(" ")
    }
}

/// Last-writer attribution refreshed on every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
    pub user_email: String,
}

impl AuditStamp {
    pub fn new(actor: &Actor, at: DateTime<Utc>) -> Self {
        Self {
            updated_at: at,
            user_id: actor.user_id.clone(),
            user_email: actor.email_or_empty(),
        }
    }
}

/// One free-text edit. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    pub at: DateTime<Utc>,
    pub by_name: String,
    pub by_email: String,
}

impl HistoryEntry {
    pub fn new(text: impl Into<String>, actor: &Actor, at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            at,
            by_name: actor.label(),
            by_email: actor.email_or_empty(),
        }
    }
}
