//! Identity provider for a hosted auth + profiles backend.
//!
//! Auth endpoints live under `/auth/v1`, profile rows under
//! `/rest/v1/profiles`. Every request carries the project's anonymous key
//! in the `apikey` header; requests made on behalf of a signed-in user
//! carry the user's access token as the bearer.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quoteconnect_application::ports::{
    IdentityProvider, KeyValueStore, Listener, ListenerRegistry, PersistenceError,
    ProviderSession, SessionChange, Subscription,
};
use quoteconnect_domain::{
    AuthAccount, AuthError, AuthResult, Credentials, Identity, ProfileRecord, SignupRequest,
    ValidationError,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use super::wire::{
    ApiErrorBody, PasswordGrant, RefreshGrant, SessionResponse, SignupBody, SignupMetadata,
    SignupResponse, UserRecord,
};

/// Storage key of the persisted token pair.
pub const TOKEN_KEY: &str = "quoteconnect.token";

const TOKEN_PATH: &str = "auth/v1/token";
const SIGNUP_PATH: &str = "auth/v1/signup";
const LOGOUT_PATH: &str = "auth/v1/logout";
const USER_PATH: &str = "auth/v1/user";
const PROFILES_PATH: &str = "rest/v1/profiles";

/// Failures inside the remote adapter, before they are mapped to
/// [`AuthError`].
#[derive(Debug, thiserror::Error)]
pub enum RemoteProviderError {
    /// Backend URL could not be parsed or joined.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection, TLS or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code, when the body had one.
        code: Option<String>,
        /// Human-readable message.
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Token persistence failed.
    #[error("token storage failed: {0}")]
    Storage(#[from] PersistenceError),
}

impl From<RemoteProviderError> for AuthError {
    fn from(err: RemoteProviderError) -> Self {
        Self::provider(err)
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct TokenPair {
    access_token: String,
    refresh_token: String,
}

impl From<&SessionResponse> for TokenPair {
    fn from(session: &SessionResponse) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

/// Identity provider reached over REST.
pub struct RemoteIdentityProvider {
    client: Client,
    base: Url,
    anon_key: String,
    tokens: RwLock<Option<TokenPair>>,
    storage: Arc<dyn KeyValueStore>,
    listeners: ListenerRegistry<SessionChange>,
}

impl RemoteIdentityProvider {
    /// Creates a provider for the backend at `base_url`.
    ///
    /// The token pair is persisted in `storage` under [`TOKEN_KEY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, RemoteProviderError> {
        let client = Client::builder()
            .user_agent(concat!("quoteconnect/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base: normalize_base(base_url)?,
            anon_key: anon_key.into(),
            tokens: RwLock::new(None),
            storage,
            listeners: ListenerRegistry::new(),
        })
    }

    /// Applies a per-request timeout at the HTTP layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be rebuilt.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, RemoteProviderError> {
        self.client = Client::builder()
            .user_agent(concat!("quoteconnect/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(self)
    }

    /// Exchanges the refresh token for a new token pair.
    ///
    /// Emits [`SessionChange::TokenRefreshed`] on success. If the backend
    /// rejects the refresh token the stored tokens are dropped and
    /// [`SessionChange::SignedOut`] is emitted.
    ///
    /// # Returns
    /// `false` when there was no session or it could not be refreshed.
    ///
    /// # Errors
    /// `Provider` on transport failure.
    pub async fn refresh_session(&self) -> AuthResult<bool> {
        let Some(tokens) = self.current_tokens().await else {
            return Ok(false);
        };
        if self.refresh_with(&tokens.refresh_token).await?.is_some() {
            self.listeners.emit(&SessionChange::TokenRefreshed);
            Ok(true)
        } else {
            self.listeners.emit(&SessionChange::SignedOut);
            Ok(false)
        }
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, RemoteProviderError> {
        let mut url = self.base.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, access_token: Option<&str>) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token.unwrap_or(&self.anon_key))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, RemoteProviderError> {
        let response = builder.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(status_error(response).await)
    }

    async fn current_tokens(&self) -> Option<TokenPair> {
        if let Some(tokens) = self.tokens.read().await.clone() {
            return Some(tokens);
        }
        let raw = match self.storage.get(TOKEN_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "failed to read stored tokens");
                return None;
            }
        };
        match serde_json::from_str::<TokenPair>(&raw) {
            Ok(tokens) => {
                *self.tokens.write().await = Some(tokens.clone());
                Some(tokens)
            }
            Err(e) => {
                warn!(error = %e, "discarding unreadable stored tokens");
                self.forget_tokens().await;
                None
            }
        }
    }

    async fn access_token(&self) -> Option<String> {
        self.current_tokens().await.map(|t| t.access_token)
    }

    async fn remember_tokens(&self, tokens: TokenPair) {
        match serde_json::to_string(&tokens) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(TOKEN_KEY, &raw).await {
                    warn!(error = %e, "failed to persist tokens; session will not survive a restart");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode tokens"),
        }
        *self.tokens.write().await = Some(tokens);
    }

    async fn forget_tokens(&self) {
        *self.tokens.write().await = None;
        if let Err(e) = self.storage.remove(TOKEN_KEY).await {
            warn!(error = %e, "failed to remove stored tokens");
        }
    }

    async fn current_user(&self, access_token: &str) -> Result<UserRecord, RemoteProviderError> {
        let url = self.endpoint(USER_PATH, &[])?;
        let response = Self::send(self.request(Method::GET, url, Some(access_token))).await?;
        decode(response).await
    }

    /// `None` when the refresh token was rejected; tokens are then dropped.
    async fn refresh_with(&self, refresh_token: &str) -> AuthResult<Option<TokenPair>> {
        let url = self.endpoint(TOKEN_PATH, &[("grant_type", "refresh_token")])?;
        let builder = self
            .request(Method::POST, url, None)
            .json(&RefreshGrant { refresh_token });
        match Self::send(builder).await {
            Ok(response) => {
                let session: SessionResponse = decode(response).await?;
                let tokens = TokenPair::from(&session);
                self.remember_tokens(tokens.clone()).await;
                debug!(user_id = %session.user.id, "access token refreshed");
                Ok(Some(tokens))
            }
            Err(RemoteProviderError::Status {
                status: 400 | 401 | 403,
                ..
            }) => {
                info!("refresh token rejected; dropping session");
                self.forget_tokens().await;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_profile(
        &self,
        access_token: &str,
        profile: &ProfileRecord,
    ) -> Result<(), RemoteProviderError> {
        let url = self.endpoint(PROFILES_PATH, &[])?;
        let builder = self
            .request(Method::POST, url, Some(access_token))
            .header("Prefer", "return=minimal")
            .json(profile);
        Self::send(builder).await.map(drop)
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn restore_session(&self) -> AuthResult<Option<Identity>> {
        let Some(tokens) = self.current_tokens().await else {
            return Ok(None);
        };

        let user = match self.current_user(&tokens.access_token).await {
            Ok(user) => user,
            Err(RemoteProviderError::Status {
                status: 401 | 403, ..
            }) => {
                debug!("stored access token expired; refreshing");
                let Some(tokens) = self.refresh_with(&tokens.refresh_token).await? else {
                    return Ok(None);
                };
                self.current_user(&tokens.access_token).await?
            }
            Err(e) => return Err(e.into()),
        };

        let account = AuthAccount::from(user);
        let profile = match self.fetch_profile(&account.id).await {
            Ok(profile) => Some(profile),
            Err(AuthError::NotFound(_)) => {
                warn!(user_id = %account.id, "restored account has no profile");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Some(Identity::from_parts(account, profile)))
    }

    async fn login(&self, credentials: &Credentials) -> AuthResult<ProviderSession> {
        let url = self.endpoint(TOKEN_PATH, &[("grant_type", "password")])?;
        let builder = self.request(Method::POST, url, None).json(&PasswordGrant {
            email: &credentials.email,
            password: &credentials.password,
        });

        let session: SessionResponse = match Self::send(builder).await {
            Ok(response) => decode(response).await?,
            Err(RemoteProviderError::Status {
                status: 400 | 401, ..
            }) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        self.remember_tokens(TokenPair::from(&session)).await;
        debug!(user_id = %session.user.id, "password grant accepted");
        Ok(ProviderSession {
            account: session.user.into(),
            profile: None,
        })
    }

    async fn signup(&self, request: &SignupRequest) -> AuthResult<Identity> {
        let url = self.endpoint(SIGNUP_PATH, &[])?;
        let builder = self.request(Method::POST, url, None).json(&SignupBody {
            email: &request.email,
            password: &request.password,
            data: SignupMetadata {
                first_name: &request.first_name,
                last_name: &request.last_name,
            },
        });

        let response = match Self::send(builder).await {
            Ok(response) => decode::<SignupResponse>(response).await?,
            Err(RemoteProviderError::Status {
                code: Some(code),
                message,
                ..
            }) if code == "weak_password" => {
                return Err(ValidationError::new("password", message).into());
            }
            Err(RemoteProviderError::Status { status, code, .. })
                if status == StatusCode::UNPROCESSABLE_ENTITY.as_u16()
                    || code.as_deref() == Some("user_already_exists") =>
            {
                return Err(AuthError::EmailInUse);
            }
            Err(e) => return Err(e.into()),
        };

        let session = match response {
            SignupResponse::Session(session) => session,
            SignupResponse::PendingConfirmation(user) => {
                info!(user_id = %user.id, "account created; awaiting email confirmation");
                return Err(AuthError::provider(
                    "account created; confirm the email address before signing in",
                ));
            }
        };
        self.remember_tokens(TokenPair::from(&session)).await;

        let account = AuthAccount::from(session.user);
        let profile = ProfileRecord {
            id: account.id.clone(),
            role: request.role,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            phone: request.phone.clone(),
            company: request.company.clone(),
        };
        if let Err(e) = self.write_profile(&session.access_token, &profile).await {
            warn!(user_id = %account.id, error = %e, "profile write failed after account creation");
            return Err(AuthError::PartialSignupFailure {
                identity: Box::new(Identity::from_parts(account, None)),
                cause: e.to_string(),
            });
        }
        Ok(Identity::from_parts(account, Some(profile)))
    }

    async fn logout(&self) -> AuthResult<()> {
        let tokens = self.current_tokens().await;
        self.forget_tokens().await;
        let Some(tokens) = tokens else {
            return Ok(());
        };

        let url = self.endpoint(LOGOUT_PATH, &[])?;
        match Self::send(self.request(Method::POST, url, Some(&tokens.access_token))).await {
            Ok(_) => Ok(()),
            Err(RemoteProviderError::Status {
                status: 401 | 403 | 404,
                ..
            }) => {
                debug!("session was already invalid on the backend");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_profile(&self, identity_id: &str) -> AuthResult<ProfileRecord> {
        let filter = format!("eq.{identity_id}");
        let url = self.endpoint(PROFILES_PATH, &[("id", filter.as_str()), ("select", "*")])?;
        let access_token = self.access_token().await;
        let response = Self::send(self.request(Method::GET, url, access_token.as_deref())).await?;
        let rows: Vec<ProfileRecord> = decode(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AuthError::NotFound(identity_id.to_string()))
    }

    fn subscribe(&self, listener: Listener<SessionChange>) -> Subscription {
        self.listeners.register(listener)
    }
}

impl fmt::Debug for RemoteIdentityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteIdentityProvider")
            .field("base", &self.base.as_str())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

fn normalize_base(base_url: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(base_url.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

async fn status_error(response: Response) -> RemoteProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
    RemoteProviderError::Status {
        status,
        code: parsed.code(),
        message: parsed.into_message().unwrap_or(body),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteProviderError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteProviderError::Decode(e.to_string()))
}
