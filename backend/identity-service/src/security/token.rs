/// JWT issuance and validation (HS256)
///
/// The issuer is built once from validated [`JwtSettings`] and is then a pure
/// function of its inputs and the clock: no global key storage, no per-call
/// configuration reads.
///
/// ## Wire format
///
/// Compact `header.payload.signature`, each segment base64url. Payload claim
/// names are `unique_name`, `email`, `nameid`, `role`, plus `iat`, `nbf`,
/// `exp`, `iss` and `aud`.
use crate::config::JwtSettings;
use crate::error::{IdentityError, Result};
use crate::security::claims::ClaimSet;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Full token payload: the claim set plus registered claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(flatten)]
    pub claims: ClaimSet,
    pub iss: String,
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp, equal to `iat`)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A signed token with the instants it was signed for
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenIssuer {
    /// Fails with `IdentityError::Configuration` when the settings are unusable
    pub fn new(settings: &JwtSettings) -> Result<Self> {
        settings.validate()?;

        let secret = settings.secret_key.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            ttl: Duration::minutes(i64::from(settings.expiry_minutes)),
        })
    }

    pub fn issue(&self, claims: ClaimSet) -> Result<IssuedToken> {
        self.issue_at(claims, Utc::now())
    }

    /// Sign `claims` as of `now`.
    ///
    /// `now` is truncated to whole seconds so that `expires_at - issued_at`
    /// equals the TTL exactly, both here and in the encoded payload.
    pub fn issue_at(&self, claims: ClaimSet, now: DateTime<Utc>) -> Result<IssuedToken> {
        let issued_at = DateTime::<Utc>::from_timestamp(now.timestamp(), 0)
            .ok_or_else(|| IdentityError::Internal("Clock out of range".to_string()))?;
        let expires_at = issued_at + self.ttl;

        let payload = TokenClaims {
            claims,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &payload, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify signature, issuer, audience and expiry, returning the payload
    pub fn validate(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_exp = true;

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
                _ => {
                    tracing::debug!(error = %err, "Token validation failed");
                    IdentityError::InvalidToken
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::Value;
    use uuid::Uuid;

    const TEST_SECRET: &str = "k3Q9vZp2Lx7Wm4Rt8Yb1Nc6Hd0Fg5Js2";

    fn test_settings() -> JwtSettings {
        JwtSettings {
            secret_key: TEST_SECRET.to_string(),
            issuer: "orderflow-identity".to_string(),
            audience: "orderflow-api".to_string(),
            expiry_minutes: 60,
        }
    }

    fn test_claims() -> ClaimSet {
        let identity = Identity {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@test.com".to_string(),
        };
        ClaimSet::from_identity(&identity, &[])
    }

    fn decode_segment(token: &str, index: usize) -> Value {
        let segment = token.split('.').nth(index).unwrap();
        let bytes = URL_SAFE_NO_PAD.decode(segment).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_token_has_three_segments() {
        let issuer = TokenIssuer::new(&test_settings()).unwrap();
        let issued = issuer.issue(test_claims()).unwrap();

        assert_eq!(issued.token.matches('.').count(), 2);
    }

    #[test]
    fn test_header_is_hs256_jwt() {
        let issuer = TokenIssuer::new(&test_settings()).unwrap();
        let issued = issuer.issue(test_claims()).unwrap();

        let header = decode_segment(&issued.token, 0);
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");
    }

    #[test]
    fn test_expiry_is_issued_at_plus_ttl() {
        let issuer = TokenIssuer::new(&test_settings()).unwrap();
        let now = DateTime::parse_from_rfc3339("2025-03-01T10:15:30.987Z")
            .unwrap()
            .with_timezone(&Utc);

        let issued = issuer.issue_at(test_claims(), now).unwrap();
        assert_eq!(issued.expires_at - issued.issued_at, Duration::minutes(60));
        assert!(issued.expires_at > issued.issued_at);

        let payload = decode_segment(&issued.token, 1);
        let iat = payload["iat"].as_i64().unwrap();
        let exp = payload["exp"].as_i64().unwrap();
        assert_eq!(iat, now.timestamp());
        assert_eq!(exp - iat, 60 * 60);
        assert_eq!(exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_payload_contains_claims_and_registered_fields() {
        let issuer = TokenIssuer::new(&test_settings()).unwrap();
        let claims = test_claims();
        let issued = issuer.issue(claims.clone()).unwrap();

        let payload = decode_segment(&issued.token, 1);
        let object = payload.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["aud", "email", "exp", "iat", "iss", "nameid", "nbf", "role", "unique_name"]
        );
        assert_eq!(payload["unique_name"], "alice");
        assert_eq!(payload["email"], "alice@test.com");
        assert_eq!(payload["nameid"], claims.identifier());
        assert_eq!(payload["role"], "NoRole");
        assert_eq!(payload["iss"], "orderflow-identity");
        assert_eq!(payload["aud"], "orderflow-api");
    }

    #[test]
    fn test_validate_round_trip() {
        let issuer = TokenIssuer::new(&test_settings()).unwrap();
        let claims = test_claims();
        let issued = issuer.issue(claims.clone()).unwrap();

        let decoded = issuer.validate(&issued.token).unwrap();
        assert_eq!(decoded.claims, claims);
        assert_eq!(decoded.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_validate_rejects_other_secret() {
        let issuer = TokenIssuer::new(&test_settings()).unwrap();
        let issued = issuer.issue(test_claims()).unwrap();

        let mut other_settings = test_settings();
        other_settings.secret_key = "Zq8Wn3Lk5Rv1Tx7Mp2Yc9Hb4Gd6Fs0Ja".to_string();
        let other = TokenIssuer::new(&other_settings).unwrap();

        assert!(matches!(
            other.validate(&issued.token),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn test_validate_rejects_other_audience() {
        let issuer = TokenIssuer::new(&test_settings()).unwrap();
        let issued = issuer.issue(test_claims()).unwrap();

        let mut other_settings = test_settings();
        other_settings.audience = "someone-else".to_string();
        let other = TokenIssuer::new(&other_settings).unwrap();

        assert!(other.validate(&issued.token).is_err());
    }

    #[test]
    fn test_validate_rejects_expired_token() {
        let issuer = TokenIssuer::new(&test_settings()).unwrap();
        let issued = issuer
            .issue_at(test_claims(), Utc::now() - Duration::hours(3))
            .unwrap();

        assert!(matches!(
            issuer.validate(&issued.token),
            Err(IdentityError::TokenExpired)
        ));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let issuer = TokenIssuer::new(&test_settings()).unwrap();
        assert!(matches!(
            issuer.validate("invalid.token.here"),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn test_invalid_settings_fail_fast() {
        let mut settings = test_settings();
        settings.issuer = String::new();

        assert!(matches!(
            TokenIssuer::new(&settings),
            Err(IdentityError::Configuration(_))
        ));
    }
}
