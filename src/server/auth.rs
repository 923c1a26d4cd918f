//! HTTP Basic authentication for the passthrough endpoints.

use super::{ApiError, AppState};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use tracing::debug;

/// Proof that the request carried the configured backend credentials.
pub struct Authorized;

impl FromRequestParts<Arc<AppState>> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match basic_credentials(&parts.headers) {
            Some((user, pass)) if state.credentials.matches(&user, &pass) => Ok(Authorized),
            Some((user, _)) => {
                debug!("Rejected credentials for user '{}'", user);
                Err(ApiError::Unauthorized)
            }
            None => Err(ApiError::Unauthorized),
        }
    }
}

/// Decode `Authorization: Basic <base64(user:pass)>`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_decodes_basic_header() {
        let (user, pass) = basic_credentials(&headers("Basic ZWRpdG9yOnMzY3JldA==")).unwrap();
        assert_eq!(user, "editor");
        assert_eq!(pass, "s3cret");
    }

    #[test]
    fn test_password_may_contain_colons() {
        let encoded = STANDARD.encode("editor:a:b");
        let (_, pass) = basic_credentials(&headers(&format!("basic {}", encoded))).unwrap();
        assert_eq!(pass, "a:b");
    }

    #[test]
    fn test_rejects_other_schemes_and_garbage() {
        assert!(basic_credentials(&HeaderMap::new()).is_none());
        assert!(basic_credentials(&headers("Bearer abc")).is_none());
        assert!(basic_credentials(&headers("Basic !!!")).is_none());
        assert!(basic_credentials(&headers(&format!("Basic {}", STANDARD.encode("nocolon")))).is_none());
    }
}
