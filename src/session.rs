//! # Auth Session Manager
//!
//! Every command that talks to Spotify goes through
//! [`SessionManager::authenticate`] first. The gate works off the durable
//! credential of the calling account:
//!
//! 1. A stored credential close to expiry is refreshed.
//! 2. The credential is checked with a profile call. The returned Spotify id
//!    has to be the one the account is linked to, otherwise the call fails
//!    with [`AuthError::IdentityMismatch`].
//! 3. Any other failure clears the credential and the flow falls through to a
//!    fresh authorization: with a callback code the code is exchanged and the
//!    account linked, without one the manager returns
//!    [`AuthOutcome::Suspend`] carrying the URL the user has to visit.
//!
//! A suspended call must not go on. [`SessionManager::authenticate`] hands
//! the redirect to the [`Interaction`] and resumes the gate with the
//! callback it gets back.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::Config,
    interaction::{Interaction, InteractionError},
    management::{CredentialStore, StoreError},
    spotify::{CatalogApi, CatalogError, auth::authorize_url},
    types::{Token, UserProfile},
    utils::generate_state_nonce,
};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "The stored Spotify credential belongs to '{actual}' but this account is linked to \
         '{expected}'. Run `crate-digger auth --reset` and sign in with the linked Spotify account."
    )]
    IdentityMismatch { expected: String, actual: String },
    #[error(
        "Spotify account '{remote_id}' is already linked to '{linked_to}'. \
         Sign in with a different Spotify account or use --account {linked_to}."
    )]
    AccountLinkConflict { remote_id: String, linked_to: String },
    #[error("Authorization was denied: {0}")]
    Denied(String),
    #[error("Authorization did not complete")]
    NotCompleted,
    #[error(transparent)]
    Remote(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Interaction(#[from] InteractionError),
}

/// Who is asking, and what to resume once authorization is done.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountContext {
    pub internal_id: String,
    pub resume: String,
}

impl AccountContext {
    pub fn new(internal_id: impl Into<String>, resume: impl Into<String>) -> Self {
        AccountContext {
            internal_id: internal_id.into(),
            resume: resume.into(),
        }
    }
}

/// Query parameters the authorization service redirects back with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub url: String,
    /// `<resume>.<nonce>`, echoed back by the callback.
    pub state: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub account_id: String,
    pub remote_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated(Session),
    Suspend(Redirect),
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub authorize_url: String,
    pub client_id: String,
    pub redirect_uri: String,
}

impl From<&Config> for AuthSettings {
    fn from(config: &Config) -> Self {
        AuthSettings {
            authorize_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }
}

pub struct SessionManager<'a, C: CatalogApi + ?Sized> {
    api: &'a C,
    store: CredentialStore,
    settings: AuthSettings,
}

impl<'a, C: CatalogApi + ?Sized> SessionManager<'a, C> {
    pub fn new(api: &'a C, store: CredentialStore, settings: AuthSettings) -> Self {
        SessionManager {
            api,
            store,
            settings,
        }
    }

    /// Runs the gate once.
    ///
    /// `callback` is the result of an earlier redirect, if any. The caller
    /// is expected to stop when this returns [`AuthOutcome::Suspend`].
    pub async fn ensure_authenticated(
        &self,
        ctx: &AccountContext,
        callback: Option<&AuthCallback>,
    ) -> Result<AuthOutcome, AuthError> {
        if let Some(token) = self.store.load(&ctx.internal_id)? {
            if let Some(session) = self.validate(ctx, token).await? {
                return Ok(AuthOutcome::Authenticated(session));
            }
        }

        if let Some(callback) = callback {
            if let Some(error) = &callback.error {
                return Err(AuthError::Denied(error.clone()));
            }
            if let Some(code) = &callback.code {
                let session = self.complete(ctx, code).await?;
                return Ok(AuthOutcome::Authenticated(session));
            }
        }

        let state = format!("{}.{}", ctx.resume, generate_state_nonce());
        let url = authorize_url(
            &self.settings.authorize_url,
            &self.settings.client_id,
            &self.settings.redirect_uri,
            &state,
        )?;
        debug!(account = %ctx.internal_id, "authorization required");

        Ok(AuthOutcome::Suspend(Redirect { url, state }))
    }

    /// Drives the gate to completion through `interaction`.
    ///
    /// One redirect is attempted at most; a callback that neither carries a
    /// code nor an error ends in [`AuthError::NotCompleted`].
    pub async fn authenticate(
        &self,
        ctx: &AccountContext,
        interaction: &dyn Interaction,
    ) -> Result<Session, AuthError> {
        let mut callback: Option<AuthCallback> = None;

        for _ in 0..2 {
            match self.ensure_authenticated(ctx, callback.as_ref()).await? {
                AuthOutcome::Authenticated(session) => return Ok(session),
                AuthOutcome::Suspend(redirect) => {
                    if callback.is_some() {
                        break;
                    }
                    let received = interaction.redirect(&redirect).await?;
                    if received.error.is_none()
                        && received.state.as_deref() != Some(redirect.state.as_str())
                    {
                        return Err(InteractionError::StateMismatch.into());
                    }
                    callback = Some(received);
                }
            }
        }

        Err(AuthError::NotCompleted)
    }

    /// Refreshes if needed and checks the credential against the profile.
    /// `None` means the credential was cleared and a new authorization is
    /// needed.
    async fn validate(
        &self,
        ctx: &AccountContext,
        mut token: Token,
    ) -> Result<Option<Session>, AuthError> {
        let now = now();

        if token.is_expired(now) {
            if token.refresh_token.is_empty() {
                self.discard(ctx, "expired without refresh token")?;
                return Ok(None);
            }
            match self.api.refresh_access_token(&token.refresh_token).await {
                Ok(grant) => {
                    token = Token::from_grant(grant, Some(&token.refresh_token), now);
                    self.store.save(&ctx.internal_id, &token)?;
                    debug!(account = %ctx.internal_id, "credential refreshed");
                }
                Err(e) => {
                    self.discard(ctx, &e.to_string())?;
                    return Ok(None);
                }
            }
        }

        self.api.set_access_token(Some(token.access_token.clone()));
        let profile = match self.api.get_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                self.discard(ctx, &e.to_string())?;
                return Ok(None);
            }
        };

        let linked = self
            .store
            .find_account(&ctx.internal_id)?
            .and_then(|account| account.remote_id);

        match linked {
            Some(expected) if expected == profile.id => Ok(Some(Session {
                account_id: ctx.internal_id.clone(),
                remote_id: profile.id,
            })),
            Some(expected) => Err(AuthError::IdentityMismatch {
                expected,
                actual: profile.id,
            }),
            None => {
                self.ensure_user(ctx, &profile)?;
                Ok(Some(Session {
                    account_id: ctx.internal_id.clone(),
                    remote_id: profile.id,
                }))
            }
        }
    }

    async fn complete(&self, ctx: &AccountContext, code: &str) -> Result<Session, AuthError> {
        let grant = self.api.exchange_code(code).await?;
        let token = Token::from_grant(grant, None, now());

        self.api.set_access_token(Some(token.access_token.clone()));
        let profile = self.api.get_profile().await?;

        self.ensure_user(ctx, &profile)?;
        self.store.save(&ctx.internal_id, &token)?;
        debug!(account = %ctx.internal_id, remote = %profile.id, "credential stored");

        Ok(Session {
            account_id: ctx.internal_id.clone(),
            remote_id: profile.id,
        })
    }

    /// Links the calling account to `profile`, keeping both sides one-to-one.
    fn ensure_user(&self, ctx: &AccountContext, profile: &UserProfile) -> Result<(), AuthError> {
        if let Some(owner) = self.store.find_account_by_remote(&profile.id)? {
            if owner.internal_id != ctx.internal_id {
                return Err(AuthError::AccountLinkConflict {
                    remote_id: profile.id.clone(),
                    linked_to: owner.internal_id,
                });
            }
        }

        if let Some(expected) = self
            .store
            .find_account(&ctx.internal_id)?
            .and_then(|account| account.remote_id)
        {
            if expected != profile.id {
                return Err(AuthError::IdentityMismatch {
                    expected,
                    actual: profile.id.clone(),
                });
            }
        }

        self.store.link_account(&ctx.internal_id, &profile.id)?;
        Ok(())
    }

    fn discard(&self, ctx: &AccountContext, reason: &str) -> Result<(), StoreError> {
        warn!(account = %ctx.internal_id, reason, "clearing stored credential");
        self.api.set_access_token(None);
        self.store.clear(&ctx.internal_id)
    }
}

fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
