//! Mapping from token claims to a verified login.

use serde::Deserialize;
use std::time::{Duration, UNIX_EPOCH};
use unologin_api::{LoginPayload, VerifiedLogin, VerifyError};

/// Claims as found in a login token or a provider response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenClaims {
    #[serde(flatten)]
    pub payload: LoginPayload,
    pub exp: Option<u64>,
}

impl TokenClaims {
    /// Check the app binding and produce the verified login.
    pub fn into_verified(self, expected_app: Option<&str>) -> Result<VerifiedLogin, VerifyError> {
        if let (Some(expected), Some(actual)) = (expected_app, self.payload.app_id.as_deref()) {
            if expected != actual {
                return Err(VerifyError::WrongApp);
            }
        }

        Ok(VerifiedLogin {
            payload: self.payload,
            expires_at: self.exp.map(|exp| UNIX_EPOCH + Duration::from_secs(exp)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(app_id: Option<&str>) -> TokenClaims {
        serde_json::from_value(serde_json::json!({
            "appId": app_id,
            "asuId": "u1",
            "userClasses": ["users_default"],
            "exp": 10,
        }))
        .unwrap()
    }

    #[test]
    fn keeps_expiry() {
        let verified = claims(None).into_verified(Some("app")).unwrap();
        assert_eq!(verified.expires_at, Some(UNIX_EPOCH + Duration::from_secs(10)));
        assert_eq!(verified.payload.asu_id, "u1");
    }

    #[test]
    fn app_mismatch_is_rejected() {
        assert_eq!(
            claims(Some("other")).into_verified(Some("app")).unwrap_err(),
            VerifyError::WrongApp
        );
        assert!(claims(Some("app")).into_verified(Some("app")).is_ok());
        assert!(claims(Some("other")).into_verified(None).is_ok());
    }
}
