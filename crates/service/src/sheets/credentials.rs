//! Service-account credentials and the signed JWT used to obtain an
//! OAuth2 access token for read-only spreadsheet access.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::errors::PriceError;

pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for the signed assertion, in seconds.
const ASSERTION_TTL_SECS: i64 = 3600;

/// The subset of a Google service-account key file we need.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl ServiceAccountCredentials {
    /// Parse the credentials blob. `None` means the blob was never supplied.
    pub fn parse(raw: Option<&str>) -> Result<Self, PriceError> {
        let raw = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PriceError::Config("spreadsheet credentials are not set".into()))?;
        let creds: Self = serde_json::from_str(raw)
            .map_err(|e| PriceError::Config(format!("invalid credentials JSON: {e}")))?;
        if creds.client_email.trim().is_empty() {
            return Err(PriceError::Config("credentials: client_email is empty".into()));
        }
        if creds.private_key.trim().is_empty() {
            return Err(PriceError::Config("credentials: private_key is empty".into()));
        }
        Ok(creds)
    }

    /// Sign the JWT-bearer assertion issued at `now` (unix seconds).
    pub fn assertion(&self, now: i64) -> Result<String, PriceError> {
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| PriceError::Config(format!("credentials: bad private_key: {e}")))?;
        let claims = Claims {
            iss: &self.client_email,
            scope: SHEETS_READONLY_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| PriceError::Config(format!("credentials: cannot sign assertion: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/service_account_key.pem");

    fn blob(email: &str, key: &str) -> String {
        serde_json::json!({ "client_email": email, "private_key": key }).to_string()
    }

    #[test]
    fn missing_blob_is_config_error() {
        assert!(matches!(ServiceAccountCredentials::parse(None), Err(PriceError::Config(_))));
        assert!(matches!(ServiceAccountCredentials::parse(Some("  ")), Err(PriceError::Config(_))));
    }

    #[test]
    fn malformed_blob_is_config_error() {
        let err = ServiceAccountCredentials::parse(Some("{not json")).unwrap_err();
        assert!(matches!(err, PriceError::Config(_)));
        let err = ServiceAccountCredentials::parse(Some(&blob("", TEST_KEY))).unwrap_err();
        assert!(matches!(err, PriceError::Config(_)));
    }

    #[test]
    fn token_uri_defaults_to_google() {
        let creds = ServiceAccountCredentials::parse(Some(&blob("svc@example.iam", TEST_KEY))).unwrap();
        assert_eq!(creds.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn assertion_is_a_three_part_jwt() {
        let creds = ServiceAccountCredentials::parse(Some(&blob("svc@example.iam", TEST_KEY))).unwrap();
        let jwt = creds.assertion(1_700_000_000).unwrap();
        assert_eq!(jwt.split('.').count(), 3);
    }

    #[test]
    fn bad_private_key_is_config_error() {
        let creds = ServiceAccountCredentials::parse(Some(&blob("svc@example.iam", "not a key"))).unwrap();
        assert!(matches!(creds.assertion(0), Err(PriceError::Config(_))));
    }

    #[test]
    fn debug_hides_private_key() {
        let creds = ServiceAccountCredentials::parse(Some(&blob("svc@example.iam", TEST_KEY))).unwrap();
        assert!(!format!("{creds:?}").contains("PRIVATE KEY"));
    }
}
