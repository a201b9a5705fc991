use std::sync::Arc;

use crate::account::errors::AccountError;
use crate::account::models::UserId;
use crate::account::ports::TokenRepository;
use crate::domain::identity::models::IdentityToken;
use crate::domain::identity::models::MatchSignal;
use crate::domain::identity::models::MultiAccountMatch;

/// Device identity tokens and duplicate-account detection.
pub struct IdentityTokenService<TR>
where
    TR: TokenRepository + ?Sized,
{
    tokens: Arc<TR>,
}

impl<TR> IdentityTokenService<TR>
where
    TR: TokenRepository + ?Sized,
{
    /// Upper bound on fresh values tried before giving up on a collision streak.
    pub const MAX_GENERATION_ATTEMPTS: usize = 8;

    pub fn new(tokens: Arc<TR>) -> Self {
        Self { tokens }
    }

    /// Return the user's identity token, creating one if none exists.
    ///
    /// Idempotent: once a token is stored every later call returns it unchanged.
    ///
    /// # Errors
    /// * `TokenGeneration` - Every candidate collided with an existing token
    /// * `StoreUnavailable` - Database operation failed
    pub async fn get_or_create_identity_token(
        &self,
        user_id: UserId,
    ) -> Result<IdentityToken, AccountError> {
        if let Some(existing) = self
            .tokens
            .identity_token_for(user_id)
            .await?
            .and_then(IdentityToken::new)
        {
            return Ok(existing);
        }

        for attempt in 1..=Self::MAX_GENERATION_ATTEMPTS {
            let candidate = IdentityToken::generate();

            if self.tokens.identity_token_exists(candidate.as_str()).await? {
                tracing::warn!(user_id = %user_id, attempt, "Identity token collision, retrying");
                continue;
            }

            let stored = self
                .tokens
                .insert_identity_token(user_id, candidate.as_str())
                .await?;

            return IdentityToken::new(stored).ok_or_else(|| {
                AccountError::StoreUnavailable("stored identity token is blank".to_string())
            });
        }

        Err(AccountError::TokenGeneration(Self::MAX_GENERATION_ATTEMPTS))
    }

    /// Whether `token` is the identity token on record for `user_id`.
    pub async fn validate_identity_token(
        &self,
        token: &IdentityToken,
        user_id: UserId,
    ) -> Result<bool, AccountError> {
        if user_id.is_anonymous() {
            return Ok(false);
        }

        self.tokens
            .identity_token_matches(user_id, token.as_str())
            .await
    }

    /// Look for an existing account seen from this IP or this device.
    ///
    /// The IP history is consulted first; when both signals would match, the
    /// reported signal is `Ip`.
    pub async fn check_multi_account(
        &self,
        ip: &str,
        token: Option<&IdentityToken>,
    ) -> Result<Option<MultiAccountMatch>, AccountError> {
        if !ip.is_empty() {
            if let Some(username) = self.tokens.user_by_ip(ip).await? {
                return Ok(Some(MultiAccountMatch {
                    username,
                    signal: MatchSignal::Ip,
                }));
            }
        }

        if let Some(token) = token {
            if let Some(username) = self.tokens.user_by_identity_token(token.as_str()).await? {
                return Ok(Some(MultiAccountMatch {
                    username,
                    signal: MatchSignal::IdentityToken,
                }));
            }
        }

        Ok(None)
    }

    /// Record that `user_id` was seen from `ip`.
    pub async fn log_ip(&self, user_id: UserId, ip: &str) -> Result<(), AccountError> {
        self.tokens.log_ip(user_id, ip).await
    }
}
