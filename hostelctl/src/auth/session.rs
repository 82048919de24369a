//! Session token creation, hashing and cookie handling.
//!
//! The browser holds an opaque random token; the server stores only its SHA-256 digest, so a
//! leaked `sessions` table cannot be replayed as cookies.

use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose};
use rand::prelude::RngExt;
use rand::rng;
use sha2::{Digest, Sha256};

use crate::config::{Config, SessionConfig};

/// Generate a secure random session token
pub fn generate_session_token() -> String {
    // Generate 32 bytes (256 bits) of cryptographically secure random data
    let mut token_bytes = [0u8; 32];
    rng().fill(&mut token_bytes);

    // Encode as base64url without padding
    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Digest used as the `sessions` primary key
pub fn hash_session_token(token: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

fn same_site(session: &SessionConfig) -> &'static str {
    match session.cookie_same_site.to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

fn cookie_attributes(session: &SessionConfig, max_age: u64) -> String {
    let secure = if session.cookie_secure { "; Secure" } else { "" };
    format!("Path=/; HttpOnly{secure}; SameSite={}; Max-Age={max_age}", same_site(session))
}

/// `Set-Cookie` value carrying a freshly issued session token
pub fn create_session_cookie(token: &str, config: &Config) -> String {
    let session = &config.auth.session;
    format!(
        "{}={}; {}",
        session.cookie_name,
        token,
        cookie_attributes(session, session.timeout.as_secs())
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(config: &Config) -> String {
    let session = &config.auth.session;
    format!("{}=; {}", session.cookie_name, cookie_attributes(session, 0))
}

/// Find the session token among the request's cookies
pub fn session_token_from_headers<'h>(headers: &'h HeaderMap, cookie_name: &str) -> Option<&'h str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;
    use axum::http::HeaderValue;

    #[test]
    fn test_generate_session_token() {
        let token1 = generate_session_token();
        let token2 = generate_session_token();

        // Tokens should be different
        assert_ne!(token1, token2);

        // Tokens should be base64url encoded (43 chars for 32 bytes)
        assert_eq!(token1.len(), 43);
        assert!(token1.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_hash_is_stable_and_distinct_from_token() {
        let token = generate_session_token();
        assert_eq!(hash_session_token(&token), hash_session_token(&token));
        assert_ne!(hash_session_token(&token), token);
        assert_ne!(hash_session_token("a"), hash_session_token("b"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = create_test_config();
        config.auth.session.cookie_same_site = "strict".to_string();

        let cookie = create_session_cookie("abc", &config);
        assert!(cookie.starts_with("hostel_session=abc; "));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));

        config.auth.session.cookie_secure = true;
        assert!(create_session_cookie("abc", &config).contains("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let config = create_test_config();
        let cookie = clear_session_cookie(&config);
        assert!(cookie.starts_with("hostel_session=; "));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_session_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token_from_headers(&headers, "hostel_session"), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; hostel_session=tok123; other=1"));
        assert_eq!(session_token_from_headers(&headers, "hostel_session"), Some("tok123"));
        assert_eq!(session_token_from_headers(&headers, "missing"), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("hostel_session="));
        assert_eq!(session_token_from_headers(&headers, "hostel_session"), None);
    }
}
