//! Session token issuance and verification.
//!
//! Sessions are stateless: a signed token carries the identity, role, and
//! validity window, and verification is a pure function of the token and the
//! server secret. There is no revocation list, so a token stays valid for its
//! full lifetime even if the account is deactivated in the meantime.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use super::principal::Identity;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    nome: String,
    email: String,
    ruolo: String,
    is_admin: bool,
    iat: i64,
    exp: i64,
}

/// Unix seconds for token validity windows.
pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Sign a session token embedding the resolved identity.
///
/// # Errors
/// Returns an error if serialization or signing fails.
pub(crate) fn issue_token(
    identity: &Identity,
    secret: &SecretString,
    ttl_seconds: i64,
) -> Result<String> {
    let now = now_unix_seconds();
    let claims = Claims {
        sub: identity.id_dipendente.to_string(),
        nome: identity.nome.clone(),
        email: identity.email.clone(),
        ruolo: identity.ruolo.clone(),
        is_admin: identity.is_admin,
        iat: now,
        exp: now.saturating_add(ttl_seconds),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .context("failed to sign session token")
}

/// Verify signature and expiry, yielding the embedded identity.
///
/// Expiry is checked without leeway so a token is rejected from the exact
/// second its window closes.
///
/// # Errors
/// Returns an error for missing/malformed/tampered/expired tokens.
pub(crate) fn verify_token(token: &str, secret: &SecretString) -> Result<Identity> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .context("session token verification failed")?;

    let claims = data.claims;
    let id_dipendente = claims
        .sub
        .parse::<i32>()
        .context("session token subject is not an id")?;

    Ok(Identity {
        id_dipendente,
        nome: claims.nome,
        email: claims.email,
        ruolo: claims.ruolo,
        is_admin: claims.is_admin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("test-signing-secret".to_string())
    }

    fn identity() -> Identity {
        Identity {
            id_dipendente: 42,
            nome: "Mario Rossi".to_string(),
            email: "mario.rossi@company.com".to_string(),
            ruolo: "responsabile".to_string(),
            is_admin: true,
        }
    }

    #[test]
    fn issued_token_verifies_within_window() -> Result<()> {
        let token = issue_token(&identity(), &secret(), 86400)?;
        let verified = verify_token(&token, &secret())?;
        assert_eq!(verified, identity());
        Ok(())
    }

    #[test]
    fn expired_token_fails_verification() -> Result<()> {
        let token = issue_token(&identity(), &secret(), -1)?;
        assert!(verify_token(&token, &secret()).is_err());
        Ok(())
    }

    #[test]
    fn tampered_token_fails_verification() -> Result<()> {
        let token = issue_token(&identity(), &secret(), 86400)?;

        // Flip one byte in the payload segment; the signature must not match.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        assert_eq!(parts.len(), 3);
        let mut payload: Vec<u8> = parts[1].clone().into_bytes();
        payload[0] = if payload[0] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload)?;
        let tampered = parts.join(".");

        assert!(verify_token(&tampered, &secret()).is_err());
        Ok(())
    }

    #[test]
    fn wrong_secret_fails_verification() -> Result<()> {
        let token = issue_token(&identity(), &secret(), 86400)?;
        assert!(verify_token(&token, &SecretString::from("other-secret".to_string())).is_err());
        Ok(())
    }

    #[test]
    fn garbage_token_fails_verification() {
        assert!(verify_token("not-a-token", &secret()).is_err());
    }
}
