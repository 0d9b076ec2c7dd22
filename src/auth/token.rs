//! Signed, expiring identity tokens (HS256 JWT).
//!
//! Decoding verifies the signature but not the expiry, so an expired token
//! still yields its subject and claims. Expiry is judged by
//! [`TokenCodec::validate`] against a caller-supplied `now`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Claim names owned by the codec; callers may not smuggle them in as extras.
const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Wire form of the token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A verified (signature-checked) token.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    pub subject: String,
    pub claims: Map<String, Value>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DecodedToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token for '{subject}' expired")]
    Expired { subject: String },

    #[error("claim '{0}' is reserved")]
    ReservedClaim(String),

    #[error("token subject must not be empty")]
    EmptySubject,

    #[error("token lifetime must be positive")]
    NonPositiveTtl,

    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Issues and verifies identity tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if ttl <= Duration::zero() {
            return Err(TokenError::NonPositiveTtl);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(
            security.jwt_secret.as_bytes(),
            Duration::hours(security.jwt_expiry_hours as i64),
        )
    }

    /// Default lifetime for tokens issued at login/registration.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(
        &self,
        subject: &str,
        extra_claims: Map<String, Value>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        if subject.is_empty() {
            return Err(TokenError::EmptySubject);
        }
        if ttl <= Duration::zero() {
            return Err(TokenError::NonPositiveTtl);
        }
        if let Some(name) = extra_claims
            .keys()
            .find(|k| RESERVED_CLAIMS.contains(&k.as_str()))
        {
            return Err(TokenError::ReservedClaim(name.clone()));
        }

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            extra: extra_claims,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify the signature and return the embedded subject and claims.
    /// Expiry is not checked here.
    pub fn decode(&self, token: &str) -> Result<DecodedToken, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(TokenError::Malformed(
                "expected three non-empty dot-separated segments".to_string(),
            ));
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::MissingRequiredClaim(claim) => {
                    TokenError::Malformed(format!("missing claim '{}'", claim))
                }
                // Anything else on a structurally complete token means the
                // bytes are not the ones we signed.
                _ => TokenError::InvalidSignature,
            })?;

        let claims = data.claims;
        let issued_at = timestamp(claims.iat)?;
        let expires_at = timestamp(claims.exp)?;

        Ok(DecodedToken {
            subject: claims.sub,
            claims: claims.extra,
            issued_at,
            expires_at,
        })
    }

    /// `Ok(true)` only for an authentic, unexpired token issued to
    /// `expected_subject`. A subject mismatch is `Ok(false)`; expiry and
    /// tampering surface as distinct errors.
    pub fn validate(
        &self,
        token: &str,
        expected_subject: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, TokenError> {
        let decoded = self.decode(token)?;
        if decoded.is_expired_at(now) {
            return Err(TokenError::Expired {
                subject: decoded.subject,
            });
        }
        Ok(decoded.subject == expected_subject)
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| TokenError::Malformed(format!("timestamp {} out of range", secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"unit-test-secret", Duration::hours(24)).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
    }

    fn profile_claims() -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("firstName".into(), json!("Ada"));
        claims.insert("lastName".into(), json!("Lovelace"));
        claims.insert("createdAt".into(), json!("2025-05-01T08:00:00Z"));
        claims
    }

    /// Replace one character of the given segment with a different base64url character.
    fn flip_char(token: &str, segment: usize) -> String {
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut chars: Vec<char> = parts[segment].chars().collect();
        let idx = chars.len() / 2;
        chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
        parts[segment] = chars.into_iter().collect();
        parts.join(".")
    }

    #[test]
    fn decode_returns_what_was_issued() {
        let codec = codec();
        let token = codec
            .issue("ada@example.com", profile_claims(), now(), Duration::hours(1))
            .unwrap();

        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded.subject, "ada@example.com");
        assert_eq!(decoded.claims, profile_claims());
        assert_eq!(decoded.issued_at, now());
        assert_eq!(decoded.expires_at, now() + Duration::hours(1));
    }

    #[test]
    fn validate_accepts_fresh_token_for_its_subject() {
        let codec = codec();
        let token = codec.issue("ada@example.com", Map::new(), now(), codec.ttl()).unwrap();
        assert_eq!(codec.validate(&token, "ada@example.com", now()), Ok(true));
        // expiry is inclusive: still valid at exactly expiresAt
        assert_eq!(
            codec.validate(&token, "ada@example.com", now() + codec.ttl()),
            Ok(true)
        );
    }

    #[test]
    fn validate_rejects_other_subject() {
        let codec = codec();
        let token = codec.issue("bob@example.com", Map::new(), now(), codec.ttl()).unwrap();
        assert_eq!(codec.validate(&token, "ada@example.com", now()), Ok(false));
    }

    #[test]
    fn expired_token_still_decodes_but_fails_validation() {
        let codec = codec();
        let token = codec
            .issue("ada@example.com", profile_claims(), now(), Duration::minutes(5))
            .unwrap();
        let later = now() + Duration::minutes(5) + Duration::seconds(1);

        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded.subject, "ada@example.com");
        assert!(decoded.is_expired_at(later));

        assert_eq!(
            codec.validate(&token, "ada@example.com", later),
            Err(TokenError::Expired {
                subject: "ada@example.com".to_string()
            })
        );
    }

    #[test]
    fn foreign_secret_is_invalid_signature() {
        let other = TokenCodec::new(b"some-other-secret", Duration::hours(1)).unwrap();
        let token = other.issue("ada@example.com", Map::new(), now(), Duration::hours(1)).unwrap();
        assert_eq!(codec().decode(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn flipped_bytes_are_invalid_signature() {
        let codec = codec();
        let token = codec
            .issue("ada@example.com", profile_claims(), now(), Duration::hours(1))
            .unwrap();

        for segment in 0..3 {
            let tampered = flip_char(&token, segment);
            assert_ne!(tampered, token);
            assert_eq!(
                codec.decode(&tampered),
                Err(TokenError::InvalidSignature),
                "segment {} tampering was not detected",
                segment
            );
        }
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        assert!(matches!(codec.decode(""), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.decode("not-a-token"), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.decode("a..c"), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn issue_rejects_reserved_claims_and_bad_input() {
        let codec = codec();
        let mut claims = Map::new();
        claims.insert("exp".into(), json!(0));
        assert_eq!(
            codec.issue("ada@example.com", claims, now(), Duration::hours(1)),
            Err(TokenError::ReservedClaim("exp".to_string()))
        );
        assert_eq!(
            codec.issue("", Map::new(), now(), Duration::hours(1)),
            Err(TokenError::EmptySubject)
        );
        assert_eq!(
            codec.issue("ada@example.com", Map::new(), now(), Duration::zero()),
            Err(TokenError::NonPositiveTtl)
        );
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            TokenCodec::new(b"", Duration::hours(1)),
            Err(TokenError::EmptySecret)
        ));
    }
}
