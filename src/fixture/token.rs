// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bearer token fixtures.
//!
//! Tokens are minted outside the harness; this module only carries them and
//! extracts the pieces the catalogs assert on.

use serde::{Deserialize, Serialize};

/// The externally issued tokens a catalog is parameterised by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Valid token signed by the first trusted issuer.
    pub issuer1: String,
    /// Valid token signed by the second trusted issuer.
    pub issuer2: String,
    /// Token whose `exp` claim is in the past.
    pub expired: String,
    /// Token with a signature no issuer accepts.
    pub invalid: String,
}

/// `Authorization` header value for `token`.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Base64url payload segment of a compact JWS, i.e. the text between the
/// first and second `.`. `None` when the token has fewer than three
/// segments or an empty payload.
pub fn payload_segment(token: &str) -> Option<&str> {
    let mut parts = token.split('.');
    let _header = parts.next()?;
    let payload = parts.next().filter(|p| !p.is_empty())?;
    parts.next()?;
    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_segment() {
        assert_eq!(payload_segment("aaa.bbb.ccc"), Some("bbb"));
    }

    #[test]
    fn test_payload_segment_rejects_malformed() {
        assert_eq!(payload_segment("no-dots"), None);
        assert_eq!(payload_segment("only.one"), None);
        assert_eq!(payload_segment("head..sig"), None);
    }

    #[test]
    fn test_bearer_format() {
        assert_eq!(bearer("abc"), "Bearer abc");
    }
}
