//! Shared API response types.

use serde::{Deserialize, Serialize};

/// Identity plus its current API key, returned by the OAuth callback and the
/// user endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyGrant {
    pub identity: String,
    pub api_key: String,
}

/// v1 calendar date. Month is zero-based (0 = January), a quirk v1 clients
/// depend on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateStruct {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// v2 calendar datetime in UTC; month is one-based here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateTimeStruct {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub iso: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_grant_uses_camel_case_api_key() {
        let grant = KeyGrant {
            identity: "github:octocat".to_string(),
            api_key: "abc123".to_string(),
        };

        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(json["identity"], "github:octocat");
        assert_eq!(json["apiKey"], "abc123");
    }
}
