//! Bearer-token issuance and the role-gate extractors.
//!
//! Every protected route goes through [`AuthedUser`] (credential only) or a
//! role extractor ([`Admin`], [`TaskCreator`], [`Worker`]) which verifies the
//! credential first and then checks the caller's stored role. Credential
//! failures never reveal whether the token was expired or tampered with.

use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{
  DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use nanoworks_core::{store::MarketStore, user::Role};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, error::ApiError, gateway::PaymentGateway};

/// Token lifetime: 24 hours from issuance.
pub const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

// ─── Keys and claims ─────────────────────────────────────────────────────────

/// HS256 signing and verification keys derived from the configured secret.
pub struct TokenKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
}

impl TokenKeys {
  pub fn new(secret: &str) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
    }
  }

  pub fn sign(&self, claims: &Claims) -> jsonwebtoken::errors::Result<String> {
    encode(&Header::default(), claims, &self.encoding)
  }

  pub fn verify(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    decode::<Claims>(token, &self.decoding, &Validation::default())
      .map(|data| data.claims)
  }
}

/// Signed token contents. `email` is the caller identity used everywhere
/// downstream; any other claims supplied at issuance ride along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub email: String,
  pub exp:   u64,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
  /// Claims for `email` expiring [`TOKEN_TTL_SECS`] from now.
  pub fn new(email: impl Into<String>) -> Self {
    Self {
      email: email.into(),
      exp:   Utc::now().timestamp() as u64 + TOKEN_TTL_SECS,
      extra: serde_json::Map::new(),
    }
  }
}

// ─── Token issuance ──────────────────────────────────────────────────────────

/// `POST /jwt` — sign the request body as token claims.
///
/// The body must be a JSON object with at least an `email` string; every
/// other member is carried into the token unchanged. Responds `{"token":…}`.
pub async fn issue<S, P>(
  State(state): State<AppState<S, P>>,
  Json(body): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let mut extra = body;
  let email = match extra.remove("email") {
    Some(serde_json::Value::String(email)) => email,
    _ => {
      return Err(ApiError::Validation("an email claim is required".into()));
    }
  };
  // `exp` is always assigned server-side.
  extra.remove("exp");

  let mut claims = Claims::new(email);
  claims.extra = extra;

  let token = state.keys.sign(&claims)?;
  Ok(Json(json!({ "token": token })))
}

// ─── Credential verification ─────────────────────────────────────────────────

/// Verify the bearer credential on `parts` and return the decoded claims.
///
/// Missing header → [`ApiError::Unauthenticated`]. A present but non-bearer
/// header, a bad signature, and an expired token all collapse into
/// [`ApiError::InvalidCredential`].
fn verify_bearer(parts: &Parts, keys: &TokenKeys) -> Result<Claims, ApiError> {
  let header_val = parts
    .headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthenticated)?;

  let token = header_val
    .strip_prefix("Bearer ")
    .ok_or(ApiError::InvalidCredential)?;

  keys.verify(token).map_err(|_| ApiError::InvalidCredential)
}

/// Verify the credential, then require the caller's stored role to match.
/// An unknown caller and a role mismatch are indistinguishable on the wire.
async fn require_role<S, P>(
  parts: &Parts,
  state: &AppState<S, P>,
  role: Role,
) -> Result<String, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let claims = verify_bearer(parts, &state.keys)?;
  let user = state
    .store
    .get_user(&claims.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  match user {
    Some(user) if user.role == role => Ok(claims.email),
    _ => Err(ApiError::Forbidden),
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// A caller with a valid credential. No role check.
#[derive(Debug)]
pub struct AuthedUser {
  pub email: String,
}

/// A caller whose stored role is `admin`.
pub struct Admin {
  pub email: String,
}

/// A caller whose stored role is `task-creator`.
pub struct TaskCreator {
  pub email: String,
}

/// A caller whose stored role is `worker`.
///
/// Part of the role vocabulary but unused by the current routes: submission
/// and withdrawal intake accept any authenticated caller and scope records
/// by the caller's own email instead.
pub struct Worker {
  pub email: String,
}

impl<S, P> FromRequestParts<AppState<S, P>> for AuthedUser
where
  S: MarketStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    let claims = verify_bearer(parts, &state.keys)?;
    Ok(AuthedUser {
      email: claims.email,
    })
  }
}

impl<S, P> FromRequestParts<AppState<S, P>> for Admin
where
  S: MarketStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    let email = require_role(parts, state, Role::Admin).await?;
    Ok(Admin { email })
  }
}

impl<S, P> FromRequestParts<AppState<S, P>> for TaskCreator
where
  S: MarketStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    let email = require_role(parts, state, Role::TaskCreator).await?;
    Ok(TaskCreator { email })
  }
}

impl<S, P> FromRequestParts<AppState<S, P>> for Worker
where
  S: MarketStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    let email = require_role(parts, state, Role::Worker).await?;
    Ok(Worker { email })
  }
}
