//! Caller identity and the admin gate.
//!
//! Token verification happens upstream; the gateway forwards verified claims
//! as `x-auth-*` headers. A request without a subject is anonymous.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use crate::{EcommerceError, Result};

pub const SUBJECT_HEADER: &str = "x-auth-subject";
pub const EMAIL_HEADER: &str = "x-auth-email";
pub const NAME_HEADER: &str = "x-auth-name";
pub const PICTURE_HEADER: &str = "x-auth-picture";
pub const TOKEN_IDENTIFIER_HEADER: &str = "x-auth-token-identifier";

/// Claims supplied by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    pub token_identifier: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>, email: Option<&str>) -> Self {
        let subject = subject.into();
        Self { token_identifier: subject.clone(), subject, email: email.map(str::to_string), name: None, picture_url: None }
    }

    /// Stable key used to attribute and deduplicate records.
    pub fn identity_key(&self) -> &str { &self.subject }

    /// Resolves the caller from gateway headers.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let claim = |name: &str| {
            headers.get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let subject = claim(SUBJECT_HEADER)?;
        Some(Self {
            token_identifier: claim(TOKEN_IDENTIFIER_HEADER).unwrap_or_else(|| subject.clone()),
            subject,
            email: claim(EMAIL_HEADER),
            name: claim(NAME_HEADER),
            picture_url: claim(PICTURE_HEADER),
        })
    }
}

/// Decides whether an identity has privileged access.
pub trait AdminPolicy: Send + Sync + fmt::Debug {
    fn is_admin(&self, identity: &Identity) -> bool;
}

/// Static allowlist of admin email addresses, compared case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct EmailAllowlist {
    emails: HashSet<String>,
}

impl EmailAllowlist {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails.into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    pub fn len(&self) -> usize { self.emails.len() }
    pub fn is_empty(&self) -> bool { self.emails.is_empty() }
}

impl AdminPolicy for EmailAllowlist {
    fn is_admin(&self, identity: &Identity) -> bool {
        identity.email.as_deref()
            .map(|e| self.emails.contains(&e.trim().to_lowercase()))
            .unwrap_or(false)
    }
}

/// Guard every privileged operation passes through.
#[derive(Clone, Debug)]
pub struct AdminGate {
    policy: Arc<dyn AdminPolicy>,
}

impl AdminGate {
    pub fn new(policy: Arc<dyn AdminPolicy>) -> Self { Self { policy } }

    pub fn require_admin<'a>(&self, caller: Option<&'a Identity>) -> Result<&'a Identity> {
        let identity = caller.ok_or(EcommerceError::Unauthorized)?;
        if !self.policy.is_admin(identity) {
            tracing::warn!(subject = %identity.subject, "admin access denied");
            return Err(EcommerceError::Forbidden);
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> AdminGate { AdminGate::new(Arc::new(EmailAllowlist::new(["Admin@Shop.com"]))) }

    #[test]
    fn test_require_admin_without_identity() {
        assert!(matches!(gate().require_admin(None), Err(EcommerceError::Unauthorized)));
    }

    #[test]
    fn test_require_admin_outside_allowlist() {
        let caller = Identity::new("user_1", Some("someone@shop.com"));
        assert!(matches!(gate().require_admin(Some(&caller)), Err(EcommerceError::Forbidden)));
        let no_email = Identity::new("user_2", None);
        assert!(matches!(gate().require_admin(Some(&no_email)), Err(EcommerceError::Forbidden)));
    }

    #[test]
    fn test_require_admin_returns_identity() {
        let caller = Identity::new("user_1", Some("admin@shop.com"));
        assert_eq!(gate().require_admin(Some(&caller)).unwrap(), &caller);
    }

    #[test]
    fn test_allowlist_normalises_entries() {
        let list = EmailAllowlist::new([" Admin@Shop.com ", "", "admin@shop.com", "ops@shop.com"]);
        assert_eq!(list.len(), 2);
        assert!(EmailAllowlist::new(["  ", ""]).is_empty());
        assert!(list.is_admin(&Identity::new("u", Some("OPS@shop.com"))));
    }

    #[derive(Debug)]
    struct SubjectPolicy;
    impl AdminPolicy for SubjectPolicy {
        fn is_admin(&self, identity: &Identity) -> bool { identity.subject == "root" }
    }

    #[test]
    fn test_policy_is_swappable() {
        let gate = AdminGate::new(Arc::new(SubjectPolicy));
        assert!(gate.require_admin(Some(&Identity::new("root", None))).is_ok());
        assert!(gate.require_admin(Some(&Identity::new("admin@shop.com", Some("admin@shop.com")))).is_err());
    }

    #[test]
    fn test_identity_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(Identity::from_headers(&headers).is_none());
        headers.insert(SUBJECT_HEADER, HeaderValue::from_static("user_9"));
        headers.insert(EMAIL_HEADER, HeaderValue::from_static("nine@shop.com"));
        let identity = Identity::from_headers(&headers).unwrap();
        assert_eq!(identity.identity_key(), "user_9");
        assert_eq!(identity.token_identifier, "user_9");
        assert_eq!(identity.email.as_deref(), Some("nine@shop.com"));
        assert!(identity.name.is_none());
    }
}
