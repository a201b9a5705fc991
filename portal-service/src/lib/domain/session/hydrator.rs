use std::sync::Arc;

use crate::account::models::RequestIdentity;
use crate::account::ports::CredentialStore;
use crate::domain::session::models::SessionData;
use crate::domain::session::models::SessionKey;
use crate::domain::session::ports::SessionStore;

/// Why a session stopped being trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    AccountMissing,
    PasswordChanged,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    Anonymous,
    Verified,
    /// The session pointed at a user but no longer matches the live
    /// credential. It has been cleared and the request proceeds anonymously.
    Invalidated(InvalidationReason),
}

/// Result of turning a session cookie into a request identity.
#[derive(Debug, Clone)]
pub struct Hydration {
    pub identity: RequestIdentity,
    pub outcome: HydrationOutcome,
    /// Session entry as it stands after hydration (cleared when invalidated).
    pub session: SessionData,
}

impl Hydration {
    fn anonymous(session: SessionData) -> Self {
        Self {
            identity: RequestIdentity::anonymous(),
            outcome: HydrationOutcome::Anonymous,
            session,
        }
    }
}

/// Per-request verification of a session against the live credential record.
///
/// Never fails: every problem, including store outages, degrades to an
/// anonymous identity.
pub struct SessionHydrator<CS, SS>
where
    CS: CredentialStore + ?Sized,
    SS: SessionStore + ?Sized,
{
    credentials: Arc<CS>,
    sessions: Arc<SS>,
}

impl<CS, SS> SessionHydrator<CS, SS>
where
    CS: CredentialStore + ?Sized,
    SS: SessionStore + ?Sized,
{
    pub fn new(credentials: Arc<CS>, sessions: Arc<SS>) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    /// Resolve the identity for a request carrying `key`.
    ///
    /// # Arguments
    /// * `key` - Session key from the cookie, if one was presented
    ///
    /// # Returns
    /// Hydration with the identity, the outcome, and the session entry
    pub async fn hydrate(&self, key: Option<&SessionKey>) -> Hydration {
        let Some(key) = key else {
            return Hydration::anonymous(SessionData::default());
        };

        let session = match self.sessions.load(key).await {
            Ok(Some(session)) => session,
            Ok(None) => return Hydration::anonymous(SessionData::default()),
            Err(e) => {
                tracing::error!(error = %e, "Session store unavailable, continuing anonymously");
                return Hydration::anonymous(SessionData::default());
            }
        };

        let user_id = session.user_id();
        if user_id.is_anonymous() {
            return Hydration::anonymous(session);
        }

        let credential = match self.credentials.find_by_id(user_id).await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                return self
                    .invalidate(key, session, InvalidationReason::AccountMissing)
                    .await
            }
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    error = %e,
                    "Credential store unavailable, continuing anonymously"
                );
                return Hydration::anonymous(session);
            }
        };

        if let Some(fingerprint) = &session.password_fingerprint {
            if !fingerprint.matches(&credential.password_hash) {
                return self
                    .invalidate(key, session, InvalidationReason::PasswordChanged)
                    .await;
            }
        }

        if !credential.privileges.is_active() {
            return self
                .invalidate(key, session, InvalidationReason::Inactive)
                .await;
        }

        let membership = match self.credentials.clan_membership(user_id).await {
            Ok(membership) => membership,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Clan lookup failed");
                None
            }
        };

        let identity = RequestIdentity::verified(&credential, membership, session.api_token.clone());

        Hydration {
            identity,
            outcome: HydrationOutcome::Verified,
            session,
        }
    }

    async fn invalidate(
        &self,
        key: &SessionKey,
        mut session: SessionData,
        reason: InvalidationReason,
    ) -> Hydration {
        tracing::info!(
            user_id = %session.user_id(),
            reason = ?reason,
            "Session no longer matches credential, clearing"
        );

        session.clear_user();

        // A failed write is retried implicitly by the next request.
        if let Err(e) = self.sessions.save(key, &session).await {
            tracing::warn!(error = %e, "Failed to persist cleared session");
        }

        Hydration {
            identity: RequestIdentity::anonymous(),
            outcome: HydrationOutcome::Invalidated(reason),
            session,
        }
    }
}
