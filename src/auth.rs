//! Credential validation.
//!
//! Tokens are issued elsewhere; this side only checks the signature and
//! expiry and trusts the embedded user id.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub user_id: i64,
  pub username: String,
}

pub trait Authenticator: Send + Sync {
  fn validate(&self, credential: &str) -> Option<Identity>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub user_id: i64,
  pub username: String,
  pub exp: i64,
}

/// HS256 JWT validation.
pub struct Jwt {
  key: DecodingKey,
  validation: Validation,
}

impl Jwt {
  pub fn new(secret: &str) -> Self {
    Self {
      key: DecodingKey::from_secret(secret.as_bytes()),
      validation: Validation::default(),
    }
  }
}

impl Authenticator for Jwt {
  fn validate(&self, credential: &str) -> Option<Identity> {
    let data = decode::<Claims>(credential, &self.key, &self.validation)
      .inspect_err(|err| tracing::debug!("Rejected token: {err}"))
      .ok()?;

    Some(Identity {
      user_id: data.claims.user_id,
      username: data.claims.username,
    })
  }
}

#[cfg(test)]
pub(crate) fn token(secret: &str, user_id: i64, ttl_secs: i64) -> String {
  use jsonwebtoken::{EncodingKey, Header, encode};

  let claims = Claims {
    user_id,
    username: format!("user{user_id}"),
    exp: chrono::Utc::now().timestamp() + ttl_secs,
  };
  encode(
    &Header::default(),
    &claims,
    &EncodingKey::from_secret(secret.as_bytes()),
  )
  .unwrap()
}
