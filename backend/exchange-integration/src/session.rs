//! Exchange session lifecycle.
//!
//! Tokens are cached per (user, session type) with the expiry pulled forward
//! by a safety buffer. Concurrent refreshes for the same key are deduplicated:
//! the first caller performs the login and every other caller awaits the same
//! outcome over a broadcast channel, success and failure alike. Per-request
//! session types bypass the cache and the dedup map entirely.

use std::{collections::HashMap, sync::Arc};

use common_utils::consts::{DEFAULT_TIMEOUT, SESSION_SAFETY_BUFFER};
use domain_types::{
    lift, parse_pipe_response, response_codes::SUCCESS_CODE, throw_if_error, CustomResult,
    DecryptedCredential, ExchangeError, SessionKey, SessionProfile, SessionTokenEntry,
    SessionType,
};
use error_stack::report;
use interfaces::{CredentialStore, SessionStore, SoapCall, SoapTransport};
use masking::PeekInterface;
use time::OffsetDateTime;
use tokio::sync::{broadcast, Mutex};

use crate::{crypto::CredentialCipher, soap};

type RefreshOutcome = Result<String, ExchangeError>;

enum Role {
    Leader(broadcast::Sender<RefreshOutcome>),
    Follower(broadcast::Receiver<RefreshOutcome>),
}

pub struct SessionManager {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    transport: Arc<dyn SoapTransport>,
    cipher: Arc<CredentialCipher>,
    envelope_prefixes: Vec<String>,
    inflight: Mutex<HashMap<SessionKey, broadcast::Sender<RefreshOutcome>>>,
}

impl SessionManager {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        transport: Arc<dyn SoapTransport>,
        cipher: Arc<CredentialCipher>,
        envelope_prefixes: Vec<String>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            transport,
            cipher,
            envelope_prefixes,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a live token for the user and session type, logging in to the
    /// exchange only when the cache cannot serve.
    pub async fn get_token(
        &self,
        user_id: &str,
        session_type: SessionType,
    ) -> CustomResult<String, ExchangeError> {
        let profile = session_type.profile();
        if profile.ttl.is_zero() {
            return self.fetch_token(user_id, &profile).await;
        }

        let key = SessionKey::new(user_id, session_type);
        if let Some(entry) = lift(self.sessions.get(&key).await)? {
            if entry.is_live(OffsetDateTime::now_utc()) {
                return Ok(entry.token);
            }
        }

        // Subscription happens under the map lock, and the leader sends under
        // the same lock after removing its entry, so a follower can never miss
        // the outcome it registered for.
        let role = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(&key) {
                Some(sender) => Role::Follower(sender.subscribe()),
                None => {
                    let (sender, _) = broadcast::channel(1);
                    inflight.insert(key.clone(), sender.clone());
                    Role::Leader(sender)
                }
            }
        };

        match role {
            Role::Follower(mut receiver) => match receiver.recv().await {
                Ok(Ok(token)) => Ok(token),
                Ok(Err(error)) => Err(report!(error)),
                Err(_) => Err(report!(ExchangeError::SessionRefreshFailed(
                    "in-flight session refresh was dropped".to_string()
                ))),
            },
            Role::Leader(sender) => {
                let outcome = self.refresh(user_id, &key, &profile).await;
                let shared = match &outcome {
                    Ok(token) => Ok(token.clone()),
                    Err(report) => Err(report.current_context().clone()),
                };
                let mut inflight = self.inflight.lock().await;
                inflight.remove(&key);
                let _ = sender.send(shared);
                drop(inflight);
                outcome
            }
        }
    }

    /// Drops one cached session; the next call re-authenticates.
    pub async fn invalidate_session(
        &self,
        user_id: &str,
        session_type: SessionType,
    ) -> CustomResult<(), ExchangeError> {
        let key = SessionKey::new(user_id, session_type);
        lift(self.sessions.delete(&key).await)
    }

    /// Drops every cached session for the user, used on credential rotation.
    pub async fn invalidate_all_sessions(&self, user_id: &str) -> CustomResult<(), ExchangeError> {
        lift(self.sessions.delete_all(user_id).await)
    }

    async fn refresh(
        &self,
        user_id: &str,
        key: &SessionKey,
        profile: &SessionProfile,
    ) -> CustomResult<String, ExchangeError> {
        let token = self.fetch_token(user_id, profile).await?;
        let expires_at = OffsetDateTime::now_utc() + profile.ttl - SESSION_SAFETY_BUFFER;
        lift(
            self.sessions
                .put(
                    key.clone(),
                    SessionTokenEntry {
                        token: token.clone(),
                        expires_at,
                    },
                )
                .await,
        )?;
        Ok(token)
    }

    async fn fetch_token(
        &self,
        user_id: &str,
        profile: &SessionProfile,
    ) -> CustomResult<String, ExchangeError> {
        let credential = self.decrypted_credential(user_id).await?;

        let body = soap::password_request_body(
            &credential.exchange_user_id,
            &credential.member_id,
            credential.password.peek(),
            credential.pass_key.peek(),
        );
        let envelope = soap::envelope(profile.login_action, &body);

        let response = lift(
            self.transport
                .soap_request(SoapCall {
                    endpoint: profile.login_endpoint,
                    soap_action: &envelope.action,
                    envelope: &envelope.xml,
                    owner_id: user_id,
                    api_name: "getPassword",
                    timeout: DEFAULT_TIMEOUT,
                })
                .await,
        )?;

        if !response.is_success() {
            tracing::warn!(
                status_code = response.status_code,
                endpoint = profile.login_endpoint,
                "exchange login returned a non-success http status"
            );
        }
        let result =
            soap::extract_soap_result(&response.body, profile.result_tag, &self.envelope_prefixes)?;
        parse_login_result(&result)
    }

    async fn decrypted_credential(
        &self,
        user_id: &str,
    ) -> CustomResult<DecryptedCredential, ExchangeError> {
        let credential = lift(self.credentials.fetch(user_id).await)?
            .ok_or_else(|| report!(ExchangeError::CredentialsNotConfigured))?;
        if !credential.active {
            return Err(report!(ExchangeError::CredentialsInactive));
        }
        Ok(DecryptedCredential {
            exchange_user_id: credential.exchange_user_id,
            member_id: credential.member_id,
            arn: credential.arn,
            euin: credential.euin,
            password: lift(self.cipher.decrypt(&credential.password))?,
            pass_key: lift(self.cipher.decrypt(&credential.pass_key))?,
        })
    }
}

/// Login results are `100|<token>`. A vendor failure code becomes a
/// categorized error; any other shape, including a success code with no
/// token, is a fatal parse failure.
fn parse_login_result(result: &str) -> CustomResult<String, ExchangeError> {
    let mut segments = result.trim().split('|');
    let code = segments.next().unwrap_or_default().trim();
    let token = segments.next().map(str::trim).unwrap_or_default();

    if code != SUCCESS_CODE {
        throw_if_error(&parse_pipe_response(result))?;
    }
    if token.is_empty() {
        return Err(report!(ExchangeError::ResponseParseFailed(format!(
            "login result carried no session token (code {code})"
        ))));
    }
    Ok(token.to_string())
}
