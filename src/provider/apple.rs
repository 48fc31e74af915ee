// Apple web sign-in callback handling
//
// The web flow (form_post / JS popup) delivers the outcome as a payload rather
// than through native delegate calls. This module turns that payload into the
// same success/failure inputs the native flow reports through `ProviderCallback`.
use crate::models::{FullName, ProviderCredential};
use crate::provider::ProviderErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Callback payload posted by Apple's web sign-in flow
#[derive(Deserialize, Debug, Default)]
pub struct AppleCallbackPayload {
    pub id_token: Option<String>,
    pub error: Option<String>,
    /// Apple sends user info on first login only, as an object or a JSON string
    pub user: Option<Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AppleUserInfo {
    pub name: Option<FullName>,
    pub email: Option<String>,
}

/// Parse Apple user information from the callback's `user` value
///
/// Accepts either a JSON object or a string containing JSON.
#[must_use]
pub fn parse_apple_user(user_value: &Value) -> Option<AppleUserInfo> {
    if let Ok(user_info) = serde_json::from_value::<AppleUserInfo>(user_value.clone()) {
        return Some(user_info);
    }

    if let Value::String(json_str) = user_value {
        if let Ok(user_info) = serde_json::from_str::<AppleUserInfo>(json_str) {
            return Some(user_info);
        }
    }

    None
}

/// Map a web-flow error string onto the platform error code it corresponds to
#[must_use]
pub fn error_code_for(error: &str) -> ProviderErrorCode {
    match error {
        "user_cancelled_authorize" | "popup_closed_by_user" => ProviderErrorCode::CANCELED,
        "popup_blocked_by_browser" => ProviderErrorCode::NOT_HANDLED,
        "invalid_request" | "invalid_client" | "invalid_grant" | "unsupported_response_type" => {
            ProviderErrorCode::INVALID_RESPONSE
        }
        _ => ProviderErrorCode::FAILED,
    }
}

impl AppleCallbackPayload {
    /// Convert the payload into a provider outcome
    ///
    /// # Errors
    ///
    /// Returns the platform error code when the payload carries an `error` field.
    pub fn into_outcome(self) -> Result<ProviderCredential, ProviderErrorCode> {
        if let Some(error) = self.error {
            log::debug!("Apple web callback reported error: {error}");
            return Err(error_code_for(&error));
        }

        let user_info = self.user.as_ref().and_then(parse_apple_user);
        if self.user.is_some() && user_info.is_none() {
            log::warn!("Apple web callback carried user info that could not be parsed");
        }

        let (full_name, email) = user_info
            .map(|info| (info.name, info.email))
            .unwrap_or_default();

        Ok(ProviderCredential {
            identity_token: self.id_token.map(String::into_bytes),
            user_identifier: None,
            full_name,
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apple_user_from_object() {
        let value = serde_json::json!({
            "name": { "firstName": "John", "lastName": "Doe" },
            "email": "john.doe@privaterelay.appleid.com"
        });
        let parsed = parse_apple_user(&value).unwrap();

        assert_eq!(parsed.name, Some(FullName::new("John", "Doe")));
        assert_eq!(
            parsed.email,
            Some("john.doe@privaterelay.appleid.com".to_string())
        );
    }

    #[test]
    fn test_parse_apple_user_from_string() {
        let value = Value::String(
            r#"{"name":{"firstName":"Jane","lastName":"Smith"},"email":"jane@apple.com"}"#
                .to_string(),
        );
        let parsed = parse_apple_user(&value).unwrap();

        assert_eq!(parsed.name, Some(FullName::new("Jane", "Smith")));
    }

    #[test]
    fn test_parse_apple_user_rejects_garbage() {
        assert!(parse_apple_user(&Value::Number(42.into())).is_none());
        assert!(parse_apple_user(&Value::String("not json".to_string())).is_none());
    }

    #[test]
    fn test_error_payload_maps_to_code() {
        let payload = AppleCallbackPayload {
            error: Some("user_cancelled_authorize".to_string()),
            ..AppleCallbackPayload::default()
        };
        assert_eq!(payload.into_outcome().unwrap_err(), ProviderErrorCode::CANCELED);

        assert_eq!(error_code_for("popup_closed_by_user"), ProviderErrorCode::CANCELED);
        assert_eq!(error_code_for("popup_blocked_by_browser"), ProviderErrorCode::NOT_HANDLED);
        assert_eq!(error_code_for("invalid_grant"), ProviderErrorCode::INVALID_RESPONSE);
        assert_eq!(error_code_for("server_error"), ProviderErrorCode::FAILED);
    }

    #[test]
    fn test_success_payload_builds_credential() {
        let payload: AppleCallbackPayload = serde_json::from_value(serde_json::json!({
            "id_token": "tok123",
            "code": "c0de",
            "user": "{\"name\":{\"firstName\":\"Jane\"},\"email\":\"jane@apple.com\"}"
        }))
        .unwrap();

        let credential = payload.into_outcome().unwrap();
        assert_eq!(credential.identity_token, Some(b"tok123".to_vec()));
        assert_eq!(credential.full_name, Some(FullName::first("Jane")));
        assert_eq!(credential.email, Some("jane@apple.com".to_string()));
    }

    #[test]
    fn test_success_payload_without_token_still_converts() {
        let credential = AppleCallbackPayload::default().into_outcome().unwrap();
        assert!(credential.identity_token.is_none());
        assert!(credential.full_name.is_none());
    }
}
