// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Session
//!
//! Identity state of one portal user: the credential source, the signed-in
//! profile and role, and the guard that keeps a session to one submission at
//! a time.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Explicit per-user context passed to every use case

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::error::GatewayError;
use crate::domain::identity::{AccessPolicy, Profile, ProfileSource, Role, TokenProvider};
use crate::infrastructure::graph::StaticTokenProvider;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No hay una sesión iniciada")]
    NotSignedIn,

    #[error("{0}")]
    DomainNotAllowed(String),

    #[error("This session does not accept bearer tokens")]
    TokenNotReplaceable,

    #[error(transparent)]
    Identity(#[from] GatewayError),
}

#[derive(Debug, Clone)]
struct SignedIn {
    profile: Profile,
    role: Role,
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub signed_in: bool,
    pub profile: Option<Profile>,
    pub role: Option<Role>,
    pub initials: Option<String>,
    pub submitting: bool,
}

pub struct Session {
    id: Uuid,
    tokens: Arc<dyn TokenProvider>,
    bearer: Option<Arc<StaticTokenProvider>>,
    mailbox: Option<String>,
    state: RwLock<Option<SignedIn>>,
    in_flight: AtomicBool,
}

impl Session {
    /// Session backed by an arbitrary token provider
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tokens,
            bearer: None,
            mailbox: None,
            state: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Delegated session using a bearer token obtained by the browser
    pub fn delegated(token: impl Into<String>) -> Self {
        let bearer = Arc::new(StaticTokenProvider::new(token));
        Self {
            id: Uuid::new_v4(),
            tokens: bearer.clone(),
            bearer: Some(bearer),
            mailbox: None,
            state: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Application-mode session acting on a named mailbox
    pub fn application(tokens: Arc<dyn TokenProvider>, mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: Some(mailbox.into()),
            ..Self::new(tokens)
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Mailbox whose drive, mail and calendar are used; `None` for the signed-in user
    pub fn mailbox(&self) -> Option<&str> {
        self.mailbox.as_deref()
    }

    /// Raw credential source, usable before sign-in
    pub fn tokens(&self) -> Arc<dyn TokenProvider> {
        self.tokens.clone()
    }

    /// Acquire a token, load the profile and apply the access policy.
    ///
    /// An account outside the allowed domain is signed out again.
    pub async fn sign_in(
        &self,
        profiles: &dyn ProfileSource,
        policy: &AccessPolicy,
    ) -> Result<Profile, SessionError> {
        self.tokens.access_token().await?;
        let profile = profiles.fetch_profile().await?;

        if let Err(message) = policy.check_domain(&profile.email) {
            warn!(email = %profile.email, "Sign-in rejected by domain restriction");
            self.sign_out();
            return Err(SessionError::DomainNotAllowed(message));
        }

        let role = policy.role_for(&profile.email);
        info!(session_id = %self.id, email = %profile.email, role = ?role, "Signed in");

        *self.state.write() = Some(SignedIn {
            profile: profile.clone(),
            role,
        });
        Ok(profile)
    }

    pub fn sign_out(&self) {
        *self.state.write() = None;
        if let Some(bearer) = &self.bearer {
            bearer.clear();
        }
    }

    /// Swap in a renewed bearer token
    pub fn replace_token(&self, token: impl Into<String>) -> Result<(), SessionError> {
        match &self.bearer {
            Some(bearer) => {
                bearer.replace(token);
                Ok(())
            }
            None => Err(SessionError::TokenNotReplaceable),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.read().is_some()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state.read().as_ref().map(|s| s.profile.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.state.read().as_ref().map(|s| s.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim the submission guard; `None` while another submission runs
    pub fn try_begin_submission(&self) -> Option<SubmissionPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmissionPermit {
                flag: &self.in_flight,
            })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().clone();
        SessionSnapshot {
            session_id: self.id,
            signed_in: state.is_some(),
            initials: state.as_ref().map(|s| s.profile.initials()),
            role: state.as_ref().map(|s| s.role),
            profile: state.map(|s| s.profile),
            submitting: self.is_submitting(),
        }
    }
}

/// Access token, only while signed in
#[async_trait]
impl TokenProvider for Session {
    async fn access_token(&self) -> Result<String, GatewayError> {
        if !self.is_signed_in() {
            return Err(GatewayError::Token("No hay una sesión iniciada".to_string()));
        }
        self.tokens.access_token().await
    }

    async fn refresh(&self) -> Result<String, GatewayError> {
        if !self.is_signed_in() {
            return Err(GatewayError::Token("No hay una sesión iniciada".to_string()));
        }
        self.tokens.refresh().await
    }
}

/// Held while a submission runs; releases the guard when dropped
pub struct SubmissionPermit<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmissionPermit<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProfile(Profile);

    #[async_trait]
    impl ProfileSource for FixedProfile {
        async fn fetch_profile(&self) -> Result<Profile, GatewayError> {
            Ok(self.0.clone())
        }
    }

    fn profile(email: &str) -> Profile {
        Profile {
            id: "1".into(),
            display_name: "Ana López".into(),
            given_name: Some("Ana".into()),
            surname: Some("López".into()),
            email: email.into(),
            job_title: None,
            department: None,
        }
    }

    fn policy() -> AccessPolicy {
        AccessPolicy {
            restrict_domain: true,
            allowed_domain: "uv.mx".into(),
            admins: vec!["ADMIN@uv.mx".into()],
        }
    }

    #[tokio::test]
    async fn test_sign_in_assigns_role() {
        let session = Session::delegated("tok");
        session
            .sign_in(&FixedProfile(profile("admin@uv.mx")), &policy())
            .await
            .unwrap();

        assert!(session.is_admin());
        let snapshot = session.snapshot();
        assert!(snapshot.signed_in);
        assert_eq!(snapshot.initials.as_deref(), Some("AL"));
        assert_eq!(session.access_token().await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_foreign_domain_is_signed_out() {
        let session = Session::delegated("tok");
        let err = session
            .sign_in(&FixedProfile(profile("ana@gmail.com")), &policy())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::DomainNotAllowed(_)));
        assert_eq!(err.to_string(), "Solo se permiten emails del dominio @uv.mx");
        assert!(!session.is_signed_in());
        assert!(session.access_token().await.is_err());
    }

    #[tokio::test]
    async fn test_access_token_requires_sign_in() {
        let session = Session::delegated("tok");
        assert!(session.access_token().await.is_err());
    }

    #[tokio::test]
    async fn test_sign_out_clears_token() {
        let session = Session::delegated("tok");
        session
            .sign_in(&FixedProfile(profile("ana@uv.mx")), &policy())
            .await
            .unwrap();
        session.sign_out();

        assert!(session.profile().is_none());
        assert!(session.tokens().access_token().await.is_err());
    }

    #[test]
    fn test_submission_guard_released_on_drop() {
        let session = Session::delegated("tok");
        {
            let _permit = session.try_begin_submission().unwrap();
            assert!(session.is_submitting());
            assert!(session.try_begin_submission().is_none());
        }
        assert!(!session.is_submitting());
        assert!(session.try_begin_submission().is_some());
    }

    #[test]
    fn test_replace_token_only_for_bearer_sessions() {
        let session = Session::new(Arc::new(StaticTokenProvider::new("a")));
        assert!(matches!(
            session.replace_token("b"),
            Err(SessionError::TokenNotReplaceable)
        ));
        assert!(Session::delegated("a").replace_token("b").is_ok());
    }
}
