//! Main client entry point.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{
    APPLICATION_PATH, AccessConfig, CHANGE_PASSWORD_PATH, FORGOT_PASSWORD_PATH,
    ORGANIZATION_PATH, RESET_PASSWORD_PATH, SDK_INIT_PATH, SIGNIN_PATH, SIGNOUT_PATH,
    SIGNUP_PATH, USER_PATH,
};
use crate::error::Result;
use crate::models::{
    AuthResponse, ChangePasswordInput, CommonInput, ForgotPasswordInput, GetApplicationInput,
    GetOrganizationInput, GetUserInput, LoginInput, LogoutInput, RefreshTokenInput,
    RegisterInput, ResetPasswordInput, SdkContext, SdkInitInput,
};
use crate::net::{AuthTransport, HttpClient, HttpTransport};
use crate::refresh::RefreshCoordinator;

/// Access identity service client.
///
/// A cheap handle: clones share the transport, the init context and the
/// refresh coordinator. Construct one per process (or per tenant) and pass
/// it where it is needed.
///
/// # Examples
///
/// ```rust,no_run
/// use access_sdk::{AccessClient, AccessConfig, RefreshTokenInput};
///
/// # async fn example() -> access_sdk::Result<()> {
/// let client = AccessClient::init(AccessConfig::default()).await?;
///
/// let refreshed = client
///     .refresh_token(RefreshTokenInput::new("stored-refresh-token"))
///     .await?;
/// println!("{}", refreshed["access_token"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AccessClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: AccessConfig,
    transport: Arc<dyn AuthTransport>,
    context: Arc<SdkContext>,
    refresh: RefreshCoordinator,
}

impl AccessClient {
    /// Create a builder for configuring the client.
    pub fn builder() -> AccessClientBuilder {
        AccessClientBuilder::new()
    }

    /// Call `/sdk-init` with the configured credentials and return a ready client.
    pub async fn init(config: AccessConfig) -> Result<Self> {
        Self::builder().config(config).build().await
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &AccessConfig {
        &self.inner.config
    }

    /// Context captured at init time.
    pub fn context(&self) -> &SdkContext {
        &self.inner.context
    }

    /// The refresh coordinator behind [`refresh_token`](Self::refresh_token).
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    // ========== Token refresh ==========

    /// Exchange a refresh token, coalescing with identical concurrent
    /// requests and reusing earlier results.
    pub async fn refresh_token(&self, input: RefreshTokenInput) -> Result<AuthResponse> {
        self.inner.refresh.refresh_token(input).await
    }

    /// Exchange a refresh token even if a result is cached.
    pub async fn force_refresh_token(&self, input: RefreshTokenInput) -> Result<AuthResponse> {
        self.inner.refresh.force_refresh(input).await
    }

    /// Forget the cached refresh result for `refresh_token`.
    pub fn invalidate_cached_refresh(&self, refresh_token: &str) -> bool {
        self.inner.refresh.invalidate(refresh_token)
    }

    // ========== One-shot operations ==========

    pub async fn login(&self, input: &LoginInput) -> Result<AuthResponse> {
        self.forward(SIGNIN_PATH, input).await
    }

    /// Sign out. On success the cached refresh result for the token is dropped.
    pub async fn logout(&self, input: &LogoutInput) -> Result<AuthResponse> {
        let response = self.forward(SIGNOUT_PATH, input).await?;
        self.inner.refresh.invalidate(&input.refresh_token);
        Ok(response)
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<AuthResponse> {
        self.forward(SIGNUP_PATH, input).await
    }

    pub async fn get_user(&self, input: &GetUserInput) -> Result<AuthResponse> {
        self.forward(USER_PATH, input).await
    }

    pub async fn get_organization(&self, input: &GetOrganizationInput) -> Result<AuthResponse> {
        self.forward(ORGANIZATION_PATH, input).await
    }

    pub async fn get_application(&self, input: &GetApplicationInput) -> Result<AuthResponse> {
        self.forward(APPLICATION_PATH, input).await
    }

    pub async fn change_password(&self, input: &ChangePasswordInput) -> Result<AuthResponse> {
        self.forward(CHANGE_PASSWORD_PATH, input).await
    }

    pub async fn forgot_password(&self, input: &ForgotPasswordInput) -> Result<AuthResponse> {
        self.forward(FORGOT_PASSWORD_PATH, input).await
    }

    pub async fn reset_password(&self, input: &ResetPasswordInput) -> Result<AuthResponse> {
        self.forward(RESET_PASSWORD_PATH, input).await
    }

    async fn forward<T: Serialize + Sync>(&self, path: &str, input: &T) -> Result<AuthResponse> {
        let body = self.inner.context.apply(input)?;
        debug!(path, "Forwarding request");
        self.inner.transport.post(path, body).await
    }
}

impl std::fmt::Debug for AccessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessClient")
            .field("base_url", &self.inner.config.base_url)
            .field("transport", &self.inner.transport.name())
            .field("refresh", &self.inner.refresh)
            .finish()
    }
}

/// Builder for [`AccessClient`].
pub struct AccessClientBuilder {
    config: AccessConfig,
    transport: Option<Arc<dyn AuthTransport>>,
    reqwest_client: Option<reqwest::Client>,
}

impl AccessClientBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: AccessConfig::default(),
            transport: None,
            reqwest_client: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: AccessConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the identity service base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the client credentials sent to `/sdk-init` and merged into requests.
    pub fn credentials(mut self, credentials: CommonInput) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Set the SDK type reported to `/sdk-init`.
    pub fn sdk_type(mut self, sdk_type: impl Into<String>) -> Self {
        self.config.sdk_type = sdk_type.into();
        self
    }

    /// Use a custom transport instead of HTTP (tests, proxies).
    pub fn transport(mut self, transport: Arc<dyn AuthTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set a custom reqwest client for the HTTP transport.
    pub fn reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.reqwest_client = Some(client);
        self
    }

    /// Build the client: set up the transport and perform `/sdk-init`.
    pub async fn build(self) -> Result<AccessClient> {
        let transport: Arc<dyn AuthTransport> = match self.transport {
            Some(transport) => transport,
            None => {
                self.config.validate()?;
                let http = match self.reqwest_client {
                    Some(client) => HttpClient::from_reqwest(client),
                    None => HttpClient::from_config(&self.config.http),
                };
                Arc::new(HttpTransport::new(http, &self.config.base_url)?)
            }
        };

        let init_input = SdkInitInput {
            common: self.config.credentials.clone(),
            sdk_type: self.config.sdk_type.clone(),
        };
        let init_response = transport
            .post(SDK_INIT_PATH, serde_json::to_value(&init_input)?)
            .await?;
        let context = Arc::new(SdkContext::new(init_response, &init_input)?);

        let refresh = RefreshCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&context),
            &self.config.refresh,
        );

        info!(
            transport = transport.name(),
            sdk_type = self.config.sdk_type.as_str(),
            "AccessClient initialized"
        );
        Ok(AccessClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                transport,
                context,
                refresh,
            }),
        })
    }
}

impl Default for AccessClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REFRESH_PATH;
    use crate::error::Error;
    use crate::net::mock::MockTransport;
    use crate::refresh::CachedResult;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn credentials() -> CommonInput {
        CommonInput::new(
            "b2aca2edb9",
            "302479106f4fc38d9ee4",
            "53d759b2-ff38-4a3c-bfb4-99198ba1586e",
            "8ad5f6ae-6dbc-4ff0-a1d2-0234344166dd",
        )
    }

    /// Echoes the path back; `/sdk-init` answers with a session id.
    fn echo_transport() -> Arc<MockTransport> {
        Arc::new(MockTransport::new(|path, _| {
            if path == SDK_INIT_PATH {
                return Ok(json!({ "session_id": "s-1" }));
            }
            Ok(json!({ "path": path }))
        }))
    }

    async fn client_with(transport: &Arc<MockTransport>) -> AccessClient {
        let transport: Arc<dyn AuthTransport> = transport.clone();
        AccessClient::builder()
            .credentials(credentials())
            .sdk_type("frontend")
            .transport(transport)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_init_posts_credentials() {
        let transport = echo_transport();
        let client = client_with(&transport).await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let (path, body) = &calls[0];
        assert_eq!(path, SDK_INIT_PATH);
        assert_eq!(body["client_id"], "b2aca2edb9");
        assert_eq!(body["sdk_type"], "frontend");

        assert_eq!(client.context().get_str("session_id"), Some("s-1"));
        assert_eq!(client.context().get_str("sdk_type"), Some("frontend"));
    }

    #[tokio::test]
    async fn test_init_failure_propagates() {
        let transport: Arc<dyn AuthTransport> = Arc::new(MockTransport::new(|_, _| {
            Err(Error::Api {
                status: 401,
                message: "bad client".into(),
            })
        }));
        let err = AccessClient::builder()
            .transport(transport)
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_base_url() {
        let err = AccessClient::builder()
            .base_url("")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_operations_hit_their_endpoints() {
        let transport = echo_transport();
        let client = client_with(&transport).await;

        let responses = vec![
            client.login(&LoginInput::default()).await.unwrap(),
            client.logout(&LogoutInput::new("rt")).await.unwrap(),
            client.register(&RegisterInput::default()).await.unwrap(),
            client.get_user(&GetUserInput::default()).await.unwrap(),
            client.get_organization(&GetOrganizationInput::default()).await.unwrap(),
            client.get_application(&GetApplicationInput::default()).await.unwrap(),
            client.change_password(&ChangePasswordInput::default()).await.unwrap(),
            client.forgot_password(&ForgotPasswordInput::default()).await.unwrap(),
            client.reset_password(&ResetPasswordInput::default()).await.unwrap(),
        ];
        let paths: Vec<&str> = responses.iter().filter_map(|r| r["path"].as_str()).collect();

        assert_eq!(
            paths,
            vec![
                SIGNIN_PATH,
                SIGNOUT_PATH,
                SIGNUP_PATH,
                USER_PATH,
                ORGANIZATION_PATH,
                APPLICATION_PATH,
                CHANGE_PASSWORD_PATH,
                FORGOT_PASSWORD_PATH,
                RESET_PASSWORD_PATH,
            ]
        );
    }

    #[tokio::test]
    async fn test_forwarded_requests_carry_context() {
        let transport = echo_transport();
        let client = client_with(&transport).await;

        let input = LoginInput {
            login_type: "login-username".into(),
            username: "hasan".into(),
            ..Default::default()
        };
        client.login(&input).await.unwrap();

        let (_, body) = transport.calls().pop().unwrap();
        assert_eq!(body["username"], "hasan");
        assert_eq!(body["type"], "login-username");
        assert_eq!(body["client_secret"], "302479106f4fc38d9ee4");
        assert_eq!(body["application_id"], "53d759b2-ff38-4a3c-bfb4-99198ba1586e");
        // The init response is context, not request payload.
        assert!(body.get("session_id").is_none());
    }

    #[tokio::test]
    async fn test_forward_errors_propagate() {
        let transport: Arc<dyn AuthTransport> = Arc::new(MockTransport::new(|path, _| {
            if path == SDK_INIT_PATH {
                return Ok(Value::Null);
            }
            Err(Error::Api {
                status: 400,
                message: "invalid password".into(),
            })
        }));
        let client = AccessClient::builder().transport(transport).build().await.unwrap();

        let err = client.login(&LoginInput::default()).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_refresh_is_coalesced_across_clones() {
        let transport = echo_transport();
        let client = client_with(&transport).await;
        let other = client.clone();

        let (a, b) = tokio::join!(
            client.refresh_token(RefreshTokenInput::new("tok1")),
            other.refresh_token(RefreshTokenInput::new("tok1")),
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.tokens_sent_to(REFRESH_PATH), vec!["tok1"]);
    }

    #[tokio::test]
    async fn test_logout_drops_cached_refresh() {
        let transport = echo_transport();
        let client = client_with(&transport).await;

        client.refresh_token(RefreshTokenInput::new("tok1")).await.unwrap();
        assert!(matches!(
            client.refresh_coordinator().cached("tok1"),
            CachedResult::Resolved(_)
        ));

        client.logout(&LogoutInput::new("tok1")).await.unwrap();
        assert_eq!(client.refresh_coordinator().cached("tok1"), CachedResult::Absent);

        client.refresh_token(RefreshTokenInput::new("tok1")).await.unwrap();
        assert_eq!(transport.tokens_sent_to(REFRESH_PATH), vec!["tok1", "tok1"]);
    }

    #[tokio::test]
    async fn test_logout_during_inflight_refresh_is_not_undone() {
        let transport = Arc::new(
            MockTransport::new(|path, _| Ok(json!({ "path": path }))).with_delay_by(|path, _| {
                if path == REFRESH_PATH {
                    Duration::from_millis(50)
                } else {
                    Duration::ZERO
                }
            }),
        );
        let client = client_with(&transport).await;

        let in_flight = tokio::spawn({
            let client = client.clone();
            async move { client.refresh_token(RefreshTokenInput::new("tok1")).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.refresh_coordinator().cached("tok1"), CachedResult::Pending);

        client.logout(&LogoutInput::new("tok1")).await.unwrap();
        in_flight.await.unwrap().unwrap();

        assert_eq!(client.refresh_coordinator().cached("tok1"), CachedResult::Absent);
        client.refresh_token(RefreshTokenInput::new("tok1")).await.unwrap();
        assert_eq!(transport.tokens_sent_to(REFRESH_PATH), vec!["tok1", "tok1"]);
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_cached_refresh() {
        let transport: Arc<dyn AuthTransport> = Arc::new(MockTransport::new(|path, _| {
            if path == SIGNOUT_PATH {
                return Err(Error::Timeout);
            }
            Ok(json!({ "ok": true }))
        }));
        let client = AccessClient::builder().transport(transport).build().await.unwrap();

        client.refresh_token(RefreshTokenInput::new("tok1")).await.unwrap();
        assert!(client.logout(&LogoutInput::new("tok1")).await.is_err());
        assert!(matches!(
            client.refresh_coordinator().cached("tok1"),
            CachedResult::Resolved(_)
        ));
    }
}
