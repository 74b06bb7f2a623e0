//! Request signing for the Lazada open platform.
//!
//! The platform authenticates every call with an HMAC-SHA256 signature over
//! the API path followed by the sorted `key``value` parameter pairs, encoded
//! as uppercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the `sign` parameter for a request.
///
/// `params` must contain every query parameter except `sign` itself.
pub(crate) fn sign_request(app_secret: &str, api_path: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut base = String::from(api_path);
    for (key, value) in sorted {
        base.push_str(key);
        base.push_str(value);
    }

    // HMAC keys of any length are valid for SHA-256
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(base.as_bytes());

    let digest = mac.finalize().into_bytes();
    digest.iter().map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_signature_shape() {
        let sig = sign_request(
            "app-secret",
            "/products/get",
            &params(&[("app_key", "12345"), ("timestamp", "1700000000000")]),
        );

        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!sig.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let p = params(&[("b", "2"), ("a", "1")]);
        let first = sign_request("secret-key", "/seller/get", &p);
        let second = sign_request("secret-key", "/seller/get", &p);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parameter_order_does_not_matter() {
        let forward = sign_request("secret-key", "/seller/get", &params(&[("a", "1"), ("b", "2")]));
        let backward = sign_request("secret-key", "/seller/get", &params(&[("b", "2"), ("a", "1")]));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_signature_depends_on_secret_and_path() {
        let p = params(&[("a", "1")]);
        let base = sign_request("secret-one", "/products/get", &p);
        assert_ne!(base, sign_request("secret-two", "/products/get", &p));
        assert_ne!(base, sign_request("secret-one", "/seller/get", &p));
    }
}
