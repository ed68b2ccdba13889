//! Per-request session state resolved from the upstream identity provider.

use serde::Serialize;
use uuid::Uuid;

use crate::ValidationError;

pub const NICKNAME_MIN_CHARS: usize = 2;
pub const NICKNAME_MAX_CHARS: usize = 20;

/// Caller identity as asserted by the auth proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    /// Nickname for a freshly created profile: the display name when it is
    /// a valid nickname, otherwise a name derived from the user id.
    #[must_use]
    pub fn default_nickname(&self) -> String {
        self.display_name
            .as_deref()
            .and_then(|name| validate_nickname(name).ok())
            .unwrap_or_else(|| self.fallback_nickname())
    }

    /// Id-derived nickname, unique as long as the id prefix is.
    #[must_use]
    pub fn fallback_nickname(&self) -> String {
        let simple = self.user_id.simple().to_string();
        format!("bunny-{}", &simple[..8])
    }
}

/// The profile fields a request needs once the caller is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub nickname: String,
    pub points: i64,
    pub rank: String,
}

/// Lifecycle of a request's caller.
///
/// `Authenticating` holds a verified identity whose profile row has not been
/// loaded (or created) yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticating(Identity),
    Authenticated {
        identity: Identity,
        profile: SessionProfile,
    },
}

impl Session {
    #[must_use]
    pub fn from_identity(identity: Option<Identity>) -> Self {
        identity.map_or(Self::Anonymous, Self::Authenticating)
    }

    /// Attach a loaded profile. Anonymous sessions stay anonymous.
    #[must_use]
    pub fn authenticate(self, profile: SessionProfile) -> Self {
        match self {
            Self::Anonymous => Self::Anonymous,
            Self::Authenticating(identity) | Self::Authenticated { identity, .. } => {
                Self::Authenticated { identity, profile }
            }
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticating(identity) | Self::Authenticated { identity, .. } => Some(identity),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        self.identity().map(|i| i.user_id)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.identity().and_then(|i| i.email.as_deref())
    }

    #[must_use]
    pub fn profile(&self) -> Option<&SessionProfile> {
        match self {
            Self::Authenticated { profile, .. } => Some(profile),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Trim a requested nickname and check its length in characters.
///
/// # Errors
///
/// Returns [`ValidationError::Nickname`] outside 2..=20 characters.
pub fn validate_nickname(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if (NICKNAME_MIN_CHARS..=NICKNAME_MAX_CHARS).contains(&len) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::Nickname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(display_name: Option<&str>) -> Identity {
        Identity {
            user_id: Uuid::parse_str("6f1c2a9e-0000-4000-8000-000000000001").unwrap(),
            email: Some("bunny@example.com".to_string()),
            display_name: display_name.map(str::to_string),
        }
    }

    fn profile() -> SessionProfile {
        SessionProfile {
            id: Uuid::nil(),
            email: None,
            nickname: "carrot".to_string(),
            points: 0,
            rank: "아기 토끼".to_string(),
        }
    }

    #[test]
    fn missing_identity_is_anonymous() {
        let session = Session::from_identity(None);
        assert_eq!(session, Session::Anonymous);
        assert!(session.user_id().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn identity_moves_through_authenticating_to_authenticated() {
        let session = Session::from_identity(Some(identity(None)));
        assert!(matches!(session, Session::Authenticating(_)));
        assert!(session.profile().is_none());

        let session = session.authenticate(profile());
        assert!(session.is_authenticated());
        assert_eq!(session.profile().map(|p| p.nickname.as_str()), Some("carrot"));
        assert_eq!(session.email(), Some("bunny@example.com"));
    }

    #[test]
    fn anonymous_cannot_be_authenticated() {
        assert_eq!(Session::Anonymous.authenticate(profile()), Session::Anonymous);
    }

    #[test]
    fn default_nickname_prefers_valid_display_name() {
        assert_eq!(identity(Some("  Hopper ")).default_nickname(), "Hopper");
        assert_eq!(identity(Some("x")).default_nickname(), "bunny-6f1c2a9e");
        assert_eq!(identity(None).default_nickname(), "bunny-6f1c2a9e");
    }

    #[test]
    fn nickname_length_counts_characters_not_bytes() {
        assert_eq!(validate_nickname("토끼").unwrap(), "토끼");
        assert_eq!(validate_nickname(" a ").unwrap_err(), ValidationError::Nickname);
        assert!(validate_nickname(&"a".repeat(21)).is_err());
        assert!(validate_nickname(&"a".repeat(20)).is_ok());
    }
}
