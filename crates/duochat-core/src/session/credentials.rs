//! Static credential table consulted at login.

use std::collections::BTreeMap;

use tracing::{info, warn};

use super::context::ChatSession;
use crate::error::LoginError;

/// Identity → secret mapping, loaded from the `users` config section.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    users: BTreeMap<String, String>,
}

impl Credentials {
    pub fn new(users: impl IntoIterator<Item = (String, String)>) -> Self {
        Credentials {
            users: users.into_iter().collect(),
        }
    }

    /// Check `identity`/`secret` and open a session with the partner.
    ///
    /// The partner is the first other configured identity in sorted order.
    pub fn verify(&self, identity: &str, secret: &str) -> Result<ChatSession, LoginError> {
        match self.users.get(identity) {
            Some(expected) if expected == secret => {}
            _ => {
                warn!(user = identity, "rejected login");
                return Err(LoginError::InvalidCredentials);
            }
        }

        let partner = self
            .partner_of(identity)
            .ok_or_else(|| LoginError::NoPartner(identity.to_string()))?;

        info!(user = identity, partner, "login accepted");
        Ok(ChatSession::new(identity, partner))
    }

    /// The other configured identity, if any.
    pub fn partner_of(&self, identity: &str) -> Option<&str> {
        self.users
            .keys()
            .map(String::as_str)
            .find(|name| *name != identity)
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new([
            ("bob".to_string(), "hunter2".to_string()),
            ("alice".to_string(), "s3cret".to_string()),
        ])
    }

    #[test]
    fn test_valid_login_pairs_with_other_user() {
        let session = creds().verify("alice", "s3cret").unwrap();
        assert_eq!(session.user, "alice");
        assert_eq!(session.partner, "bob");

        let session = creds().verify("bob", "hunter2").unwrap();
        assert_eq!(session.partner, "alice");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        assert_eq!(
            creds().verify("alice", "hunter2").unwrap_err(),
            LoginError::InvalidCredentials
        );
    }

    #[test]
    fn test_unknown_user_rejected() {
        assert_eq!(
            creds().verify("mallory", "s3cret").unwrap_err(),
            LoginError::InvalidCredentials
        );
    }

    #[test]
    fn test_single_user_has_no_partner() {
        let creds = Credentials::new([("solo".to_string(), "pw".to_string())]);
        assert_eq!(
            creds.verify("solo", "pw").unwrap_err(),
            LoginError::NoPartner("solo".to_string())
        );
    }

    #[test]
    fn test_both_sides_share_one_store() {
        let a = creds().verify("alice", "s3cret").unwrap();
        let b = creds().verify("bob", "hunter2").unwrap();
        assert_eq!(a.store_id, b.store_id);
    }
}
