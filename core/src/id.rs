use std::{fmt, ops::Deref};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum NameError {
    #[error("empty name")]
    Empty,
    #[error("missing '.' separator")]
    Undotted,
}

/// Fully qualified action name in `namespace.verb` form, e.g.
/// `music.mpd.play`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct ActionName(CompactString);

impl ActionName {
    /// Everything before the last `.`, i.e. the owning plugin namespace.
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once('.').map(|(ns, _)| ns).unwrap_or("")
    }

    /// Everything after the last `.`.
    pub fn verb(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, verb)| verb).unwrap_or(&self.0)
    }

    /// Validating constructor for names typed in by a user.
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }

        match name.rsplit_once('.') {
            Some((ns, verb)) if !ns.is_empty() && !verb.is_empty() => Ok(Self(name.into())),
            _ => Err(NameError::Undotted),
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ActionName {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for ActionName {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl Deref for ActionName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Dotted event type string, e.g. `music.MusicPlayEvent`. Used as the
/// dispatch key for pushed events.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct EventType(CompactString);

impl EventType {
    /// Everything before the last `.`.
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once('.').map(|(ns, _)| ns).unwrap_or("")
    }

    /// Everything after the last `.`, i.e. the event class name.
    pub fn class_name(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, class)| class).unwrap_or(&self.0)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl Deref for EventType {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
