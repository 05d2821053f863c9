use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::auth::AuthData;

/// Everything the host hands to a trigger for a single invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(rename = "inputData", default)]
    pub input_data: InputData,
    #[serde(rename = "authData")]
    pub auth_data: AuthData,
    #[serde(default)]
    pub meta: Meta,
}

impl RequestContext {
    pub fn new(auth_data: AuthData) -> Self {
        Self {
            input_data: InputData::default(),
            auth_data,
            meta: Meta::default(),
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.input_data.insert(key, value);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.meta.page = page;
        self
    }
}

/// Form values entered by the user, keyed by field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct InputData(Map<String, Value>);

impl InputData {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Non-empty string value of a field. Empty strings, `null` and
    /// non-string values are treated as unset, like an untouched form field.
    pub fn string(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::String(value)) if !value.is_empty() => Some(value.as_str()),
            _ => None,
        }
    }

    /// First field in `keys` holding a value, in the given order.
    pub fn first_present(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.string(key))
    }
}

/// Invocation flags set by the host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meta {
    /// Zero for the first page, incremented by the host for each further page.
    /// Hosts that only flag continuations may send a boolean instead.
    #[serde(default, deserialize_with = "page_flag")]
    pub page: u32,
}

fn page_flag<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PageFlag {
        Flag(bool),
        Index(u32),
        Missing(()),
    }

    Ok(match PageFlag::deserialize(deserializer)? {
        PageFlag::Flag(flag) => u32::from(flag),
        PageFlag::Index(page) => page,
        PageFlag::Missing(()) => 0,
    })
}

impl Meta {
    pub fn is_continuation(&self) -> bool {
        self.page > 0
    }
}
