//! Session credential validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use super::{AuthError, Claims};

/// Verifies signed session credentials against the process-wide secret.
///
/// A pure function of (token, secret): no I/O, no mutation. The secret is
/// fixed at construction and immutable for the process lifetime.
#[derive(Clone)]
pub struct Validator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Validator {
    /// Build a validator for HS256 credentials signed with `secret`.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear(); // Allow missing exp/iss/aud

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decode and verify a credential, returning its claims.
    ///
    /// A structurally valid token without a `login` identity fails here,
    /// not at use-time in the gate.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    _ => AuthError::MalformedCredential(e.to_string()),
                }
            })?;

        if token_data.claims.login.is_empty() {
            return Err(AuthError::MissingIdentityClaim);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "validator-unit-test-secret-at-least-32-chars";

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_credential_round_trip() {
        let validator = Validator::new(SECRET);
        let token = sign(&Claims::new("alice", 3600), SECRET);

        let claims = validator.validate(&token).unwrap();
        assert_eq!(claims.login, "alice");
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let validator = Validator::new(SECRET);
        let token = sign(
            &Claims::new("alice", 3600),
            "a-different-secret-also-32-characters-xx",
        );

        assert!(matches!(
            validator.validate(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let validator = Validator::new(SECRET);

        for token in ["", "not-a-token", "a.b", "a.b.c.d"] {
            assert!(
                matches!(
                    validator.validate(token),
                    Err(AuthError::MalformedCredential(_))
                ),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_expired_credential_is_rejected() {
        let validator = Validator::new(SECRET);
        let mut claims = Claims::new("alice", 3600);
        claims.exp = Some(chrono::Utc::now().timestamp() - 600);
        let token = sign(&claims, SECRET);

        assert!(matches!(
            validator.validate(&token),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_credential_without_expiry_is_accepted() {
        // Session lifetime is the issuer's concern; exp is optional.
        let validator = Validator::new(SECRET);
        let claims = Claims {
            login: "alice".to_string(),
            exp: None,
            iat: None,
            sub: None,
        };
        let token = sign(&claims, SECRET);

        assert_eq!(validator.validate(&token).unwrap().login, "alice");
    }

    #[test]
    fn test_missing_login_claim_is_rejected() {
        let validator = Validator::new(SECRET);
        let claims = Claims {
            login: String::new(),
            exp: None,
            iat: None,
            sub: Some("subject-without-login".to_string()),
        };
        let token = sign(&claims, SECRET);

        assert!(matches!(
            validator.validate(&token),
            Err(AuthError::MissingIdentityClaim)
        ));
    }
}
