//! Identity-token claim extraction, shared by the session store and the
//! route guards so both sides agree on one precedence order:
//! role: `custom:role`, then `role`; groups: `cognito:groups`, then `groups`.
//! Malformed tokens yield `None`/empty, never a panic; the callers fail
//! closed on their own terms.

use base64::Engine;
use serde_json::Value;
use thiserror::Error;

/// Provider-specific role claim, checked before the generic key.
pub const ROLE_CLAIM_KEYS: [&str; 2] = ["custom:role", "role"];
/// Provider-specific group claim, checked before the generic key.
pub const GROUP_CLAIM_KEYS: [&str; 2] = ["cognito:groups", "groups"];

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("token is not a three-segment JWT")]
    Shape,
    #[error("payload segment is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the payload segment of a compact JWT without verifying the
/// signature. Verification belongs to the backend; this layer only reads
/// claims for display and routing decisions.
pub fn decode_payload(token: &str) -> Result<Value, ClaimError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_sig)) = (segments.next(), segments.next(), segments.next()) else {
        return Err(ClaimError::Shape);
    };
    if segments.next().is_some() {
        return Err(ClaimError::Shape);
    }
    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(payload)?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Payload claims, or `None` for anything that does not parse.
pub fn payload(token: &str) -> Option<Value> {
    match decode_payload(token) {
        Ok(v) => Some(v),
        Err(e) => {
            crate::tprintln!("claims: unreadable token payload: {}", e);
            None
        }
    }
}

/// Role claim under the documented precedence. Absent key, non-string value
/// or unreadable token all come back `None`; the session store supplies the
/// "customer" fallback.
pub fn role_claim(token: &str) -> Option<String> {
    let claims = payload(token)?;
    for key in ROLE_CLAIM_KEYS {
        if let Some(role) = claims.get(key).and_then(|v| v.as_str()) {
            return Some(role.to_string());
        }
    }
    None
}

/// Group memberships under the documented precedence. The first key that is
/// present wins even if its list is empty; non-string members are skipped.
pub fn group_claims(token: &str) -> Vec<String> {
    let Some(claims) = payload(token) else { return Vec::new(); };
    for key in GROUP_CLAIM_KEYS {
        if let Some(arr) = claims.get(key).and_then(|v| v.as_array()) {
            return arr.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect();
        }
    }
    Vec::new()
}

/// Build an unsigned development token carrying the given payload. Used by
/// the canned provider and by tests; never accepted by any hosted surface.
pub fn unsigned_token(claims: &Value) -> String {
    let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(serde_json::json!({"alg": "none", "typ": "JWT"}).to_string());
    let payload = engine.encode(claims.to_string());
    format!("{}.{}.", header, payload)
}
