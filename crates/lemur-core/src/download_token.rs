//! Signed, expiring, member-bound download tokens for gated documents.
//!
//! Payload: `document_id:user_id:expires_at` (decimal, unix seconds).
//! Token = base64url(payload || ":" || hex(HMAC-SHA256(secret, payload))), unpadded.
//!
//! Tokens are never stored: everything needed to verify one is inside it.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Why a token was refused. The host decides how to word each case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Download token is malformed")]
    Malformed,

    #[error("Download token has expired")]
    Expired,

    #[error("Download token belongs to another user")]
    WrongUser,

    #[error("Download token signature does not match")]
    BadSignature,
}

/// Claims carried by a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DownloadToken {
    pub document_id: u64,
    pub user_id: u64,
    pub expires_at: i64,
}

/// Build a token for `user_id` valid for `ttl_secs` from now.
pub fn generate(document_id: u64, user_id: u64, ttl_secs: i64, secret: &[u8]) -> String {
    generate_at(
        document_id,
        user_id,
        ttl_secs,
        secret,
        chrono::Utc::now().timestamp(),
    )
}

/// Same as [`generate`] with an explicit clock.
pub fn generate_at(
    document_id: u64,
    user_id: u64,
    ttl_secs: i64,
    secret: &[u8],
    now: i64,
) -> String {
    let expires_at = now.saturating_add(ttl_secs);
    let payload = format!("{}:{}:{}", document_id, user_id, expires_at);
    let signature = sign(&payload, secret);

    base64_url_encode(format!("{}:{}", payload, signature).as_bytes())
}

/// Verify a token presented by `current_user_id` at time `now`.
///
/// Checks run in a fixed order: shape, expiry, owner, signature.
pub fn resolve(
    token: &str,
    current_user_id: u64,
    secret: &[u8],
    now: i64,
) -> Result<DownloadToken, TokenError> {
    let decoded = base64_url_decode(token.trim()).map_err(|_| TokenError::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Malformed)?;

    let parts: Vec<&str> = decoded.split(':').collect();
    let [document_id, user_id, expires_at, signature] = parts.as_slice() else {
        return Err(TokenError::Malformed);
    };

    let document_id: u64 = parse_canonical(document_id)?;
    let user_id: u64 = parse_canonical(user_id)?;
    let expires_at: i64 = parse_canonical(expires_at)?;

    if expires_at < now {
        tracing::debug!(document_id, expires_at, now, "Download token expired");
        return Err(TokenError::Expired);
    }

    if user_id != current_user_id {
        tracing::warn!(
            document_id,
            token_user_id = user_id,
            current_user_id,
            "Download token presented by a different user"
        );
        return Err(TokenError::WrongUser);
    }

    let expected = sign(
        &format!("{}:{}:{}", document_id, user_id, expires_at),
        secret,
    );
    if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        tracing::warn!(document_id, user_id, "Download token signature mismatch");
        return Err(TokenError::BadSignature);
    }

    Ok(DownloadToken {
        document_id,
        user_id,
        expires_at,
    })
}

/// URL path that carries `token` as its last segment.
pub fn download_path(prefix: &str, token: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), token)
}

/// Plain decimal only: no sign, no leading zeros. Each payload has exactly
/// one encoding.
fn parse_canonical<T: std::str::FromStr>(part: &str) -> Result<T, TokenError> {
    let canonical = !part.is_empty()
        && part.bytes().all(|b| b.is_ascii_digit())
        && (part == "0" || !part.starts_with('0'));
    if !canonical {
        return Err(TokenError::Malformed);
    }
    part.parse::<T>().map_err(|_| TokenError::Malformed)
}

fn sign(payload: &str, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn base64_url_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn base64_url_decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(s)
}
