//! Who the client is signed in as.

use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::models::user::PublicUser;
use crate::Claims;

/// Bearer token plus the user it resolved to on the last [`refresh`](super::ApiClient::refresh).
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    user: Option<PublicUser>,
}

impl Session {
    pub fn with_token(token: impl Into<String>) -> Self {
        Session {
            token: Some(token.into()),
            user: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<u32> {
        self.user.as_ref().map(|user| user.id)
    }

    /// Signed in means the server confirmed the token, not merely that one is stored.
    pub fn is_signed_in(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub(crate) fn set_token(&mut self, token: String) {
        self.token = Some(token);
        self.user = None;
    }

    pub(crate) fn set_user(&mut self, user: PublicUser) {
        self.user = Some(user);
    }

    pub(crate) fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// Reads the `sub` claim without checking the signature. Display only.
    pub fn token_subject(&self) -> Option<String> {
        let token = self.token.as_deref()?;
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(sub: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            name: "kim".to_string(),
            iat: 0,
            exp: 1,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-only")).unwrap()
    }

    #[test]
    fn test_token_alone_is_not_signed_in() {
        let mut session = Session::with_token(token("12"));
        assert!(!session.is_signed_in());

        session.set_user(PublicUser {
            id: 12,
            name: "kim".to_string(),
            display_name: "Kim".to_string(),
            email: "kim@example.com".to_string(),
        });
        assert!(session.is_signed_in());
        assert_eq!(session.user_id(), Some(12));

        session.clear();
        assert!(!session.is_signed_in());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_subject_readable_without_secret() {
        let session = Session::with_token(token("12"));
        assert_eq!(session.token_subject().as_deref(), Some("12"));
        assert_eq!(Session::with_token("garbage").token_subject(), None);
        assert_eq!(Session::default().token_subject(), None);
    }
}
