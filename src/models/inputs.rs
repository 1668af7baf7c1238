//! Request bodies for the identity service endpoints.
//!
//! Every input flattens a [`CommonInput`] carrying the client credentials.
//! Leaving those fields empty is fine: the client fills them from the
//! context stored at `/sdk-init` time before the request is sent.

use serde::{Deserialize, Serialize};

use crate::config::REFRESH_GRANT_TYPE;

/// Client/application/organization identifiers shared by every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonInput {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization_id: String,
}

impl CommonInput {
    /// Names of the credential fields, as they appear on the wire.
    pub const FIELDS: [&'static str; 4] =
        ["client_id", "client_secret", "application_id", "organization_id"];

    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        application_id: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            application_id: application_id.into(),
            organization_id: organization_id.into(),
        }
    }
}

/// Body of `/sdk-init`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SdkInitInput {
    #[serde(flatten)]
    pub common: CommonInput,
    #[serde(default)]
    pub sdk_type: String,
}

/// Body of `/auth/signin`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    #[serde(flatten)]
    pub common: CommonInput,
    /// Login method, e.g. `login-username`.
    #[serde(rename = "type")]
    pub login_type: String,
    pub response_type: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
    pub region: String,
    pub redirect_uri: String,
    pub country_code: String,
}

/// Body of `/auth/signup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterInput {
    #[serde(flatten)]
    pub common: CommonInput,
    /// Free-form profile attributes stored with the account.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub sdk_type: String,
    #[serde(rename = "type")]
    pub register_type: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub affiliation: String,
    pub id_card: String,
    pub region: String,
    pub provider: String,
    pub code: String,
    pub state: String,
    pub redirect_uri: String,
    pub method: String,
    pub email_code: String,
    pub phone_code: String,
    pub country_code: String,
    pub auto_sign_in: bool,
    pub relay_state: String,
    pub captcha_type: String,
    pub captcha_token: String,
    pub mfa_type: String,
    pub passcode: String,
    pub recovery_code: String,
}

/// Body of `/auth/signout`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoutInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub refresh_token: String,
}

impl LogoutInput {
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            common: CommonInput::default(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Body of `/auth/refresh`.
///
/// `refresh_token` doubles as the coalescing key of the refresh coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub refresh_token: String,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
}

fn default_grant_type() -> String {
    REFRESH_GRANT_TYPE.to_string()
}

impl RefreshTokenInput {
    /// Refresh input with the standard `refresh_token` grant type.
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            common: CommonInput::default(),
            refresh_token: refresh_token.into(),
            grant_type: default_grant_type(),
        }
    }

    /// Override the grant type discriminator.
    pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = grant_type.into();
        self
    }

    /// Set explicit credentials instead of relying on the client context.
    pub fn with_common(mut self, common: CommonInput) -> Self {
        self.common = common;
        self
    }
}

/// Body of `/auth/user`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetUserInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub access_token: String,
}

/// Body of `/organization`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetOrganizationInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub access_token: String,
}

/// Body of `/application`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetApplicationInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub access_token: String,
}

/// Body of `/auth/change-password`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangePasswordInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub access_token: String,
    pub old_password: String,
    pub new_password: String,
}

/// Body of `/auth/forgot-password`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub redirect_uri: String,
}

/// Body of `/auth/reset-password`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetPasswordInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub username: String,
    pub email: String,
    pub code: String,
    pub new_password: String,
}
