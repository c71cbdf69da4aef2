use serde::{Deserialize, Serialize};

/// What a login session remembers about its owner.
///
/// Stored as `{"user": <id>}`; anything else in the row fails to decode.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionData {
    #[serde(rename = "user")]
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::SessionData;

    #[test]
    fn serializes_as_user_record() {
        let json = serde_json::to_string(&SessionData { user_id: 42 }).unwrap();
        assert_eq!(json, r#"{"user":42}"#);
    }

    #[test]
    fn rejects_payloads_without_a_user() {
        assert!(serde_json::from_str::<SessionData>(r#"{"passport":{}}"#).is_err());
        assert!(serde_json::from_str::<SessionData>(r#"{"user":"abc"}"#).is_err());
    }
}
