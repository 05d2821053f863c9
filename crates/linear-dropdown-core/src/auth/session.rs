use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored credentials handed to every lookup invocation.
///
/// The key is a Linear personal API key and is sent as the `authorization`
/// header exactly as stored, without any scheme prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthData {
    pub api_key: String,
    #[serde(default = "default_created_at")]
    pub created_at: DateTime<Utc>,
}

fn default_created_at() -> DateTime<Utc> {
    Utc::now()
}

impl AuthData {
    pub fn new_api_key(api_key: String) -> Self {
        Self {
            api_key,
            created_at: Utc::now(),
        }
    }

    /// Value for the `authorization` request header.
    pub fn authorization_header(&self) -> &str {
        &self.api_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_header_is_raw_key() {
        let auth = AuthData::new_api_key("lin_api_abc".into());
        assert_eq!(auth.authorization_header(), "lin_api_abc");
    }

    #[test]
    fn created_at_defaults_when_missing() {
        let auth: AuthData = serde_json::from_str(r#"{"api_key":"k"}"#).unwrap();
        assert_eq!(auth.api_key, "k");
        assert!(auth.created_at <= Utc::now());
    }
}
