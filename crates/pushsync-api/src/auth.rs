use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Credentials for authenticating against a remote push service.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    /// OAuth2 access token, sent as `Authorization: Bearer <token>`.
    /// The topic registry additionally expects `access_token_auth: true`.
    Bearer { token: SecretString },

    /// Legacy server key, sent as `Authorization: key=<key>`.
    ServerKey { key: SecretString },

    /// No credentials (e.g. a token service on a trusted network).
    #[default]
    Anonymous,
}

impl Credentials {
    /// Build the default headers that carry these credentials.
    ///
    /// Header values are marked sensitive so they never show up in
    /// reqwest's debug output.
    pub fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();

        let value = match self {
            Self::Bearer { token } => {
                headers.insert("access_token_auth", HeaderValue::from_static("true"));
                format!("Bearer {}", token.expose_secret())
            }
            Self::ServerKey { key } => format!("key={}", key.expose_secret()),
            Self::Anonymous => return Ok(headers),
        };

        let mut value = HeaderValue::from_str(&value).map_err(|e| Error::Authentication {
            message: format!("invalid authorization header value: {e}"),
        })?;
        value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, value);

        Ok(headers)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bearer_sets_authorization_and_flag() {
        let creds = Credentials::Bearer {
            token: SecretString::from("ya29.abc".to_string()),
        };
        let headers = creds.headers().unwrap();
        assert_eq!(headers["authorization"], "Bearer ya29.abc");
        assert!(headers["authorization"].is_sensitive());
        assert_eq!(headers["access_token_auth"], "true");
    }

    #[test]
    fn server_key_uses_key_scheme() {
        let creds = Credentials::ServerKey {
            key: SecretString::from("AAAA".to_string()),
        };
        let headers = creds.headers().unwrap();
        assert_eq!(headers["authorization"], "key=AAAA");
        assert!(headers.get("access_token_auth").is_none());
    }

    #[test]
    fn anonymous_has_no_headers() {
        assert!(Credentials::Anonymous.headers().unwrap().is_empty());
    }

    #[test]
    fn rejects_header_breaking_tokens() {
        let creds = Credentials::Bearer {
            token: SecretString::from("bad\ntoken".to_string()),
        };
        assert!(matches!(creds.headers(), Err(Error::Authentication { .. })));
    }
}
