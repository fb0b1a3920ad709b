use serde::{Deserialize, Serialize};

/// The DJ hosting a dancefloor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DjProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Whether the dancefloor is currently open for requests
    #[serde(default)]
    pub active: bool,
}

/// The answer of the auth collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_logged_in: bool,
    #[serde(default)]
    pub dj: Option<DjProfile>,
}

/// Which variant of the session view the current client gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// The DJ who owns the dancefloor, allowed to change request status
    Host,
    /// Anyone else
    Guest,
}

impl SessionRole {
    /// Derives the role from the auth status and the profile of the session's DJ
    pub fn derive(auth: &AuthStatus, session_dj: Option<&DjProfile>) -> Self {
        let owner = auth
            .dj
            .as_ref()
            .zip(session_dj)
            .map(|(me, owner)| me.id == owner.id)
            .unwrap_or_default();

        if auth.is_logged_in && owner {
            Self::Host
        } else {
            Self::Guest
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dj(id: &str) -> DjProfile {
        DjProfile {
            id: id.to_string(),
            name: "DJ".to_string(),
            bio: None,
            active: true,
        }
    }

    #[test]
    fn owner_is_host() {
        let auth = AuthStatus {
            is_logged_in: true,
            dj: Some(dj("d1")),
        };

        assert_eq!(SessionRole::derive(&auth, Some(&dj("d1"))), SessionRole::Host);
        assert_eq!(SessionRole::derive(&auth, Some(&dj("d2"))), SessionRole::Guest);
        assert_eq!(SessionRole::derive(&auth, None), SessionRole::Guest);
    }

    #[test]
    fn logged_out_is_guest() {
        let auth = AuthStatus {
            is_logged_in: false,
            dj: Some(dj("d1")),
        };

        assert_eq!(SessionRole::derive(&auth, Some(&dj("d1"))), SessionRole::Guest);
    }

    #[test]
    fn decodes_auth_check() {
        let auth: AuthStatus = serde_json::from_str(r#"{"isLoggedIn":false}"#).unwrap();
        assert!(!auth.is_logged_in);
        assert!(auth.dj.is_none());
    }
}
