use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::error::Error;
use crate::poll::PollPolicy;
use crate::types::SessionId;

/// Default station API host.
pub const DEFAULT_BASE_URL: &str = "https://stationapi.veriff.com";

/// Default per-request HTTP timeout, independent of the poll budget.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CLIENT_KEY_HINT_LEN: usize = 8;

/// API credentials issued per integration.
///
/// Loaded once and read-only for the process lifetime. The shared secret
/// only ever leaves this struct as an HMAC digest; `Debug` output and error
/// reports carry at most a truncated client-key hint.
#[derive(Clone)]
pub struct Credentials {
    client_key: String,
    shared_secret: SecretString,
}

impl Credentials {
    pub fn new(client_key: impl Into<String>, shared_secret: impl Into<String>) -> Result<Self> {
        let client_key = client_key.into();
        let shared_secret = shared_secret.into();

        let mut missing = Vec::new();
        if client_key.trim().is_empty() {
            missing.push("client_key".to_owned());
        }
        if shared_secret.trim().is_empty() {
            missing.push("shared_secret".to_owned());
        }
        if !missing.is_empty() {
            return Err(Error::precondition(missing));
        }

        Ok(Credentials {
            client_key,
            shared_secret: SecretString::from(shared_secret),
        })
    }

    #[must_use]
    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    /// Truncated key echoed into diagnostics and logs.
    pub(crate) fn client_key_hint(&self) -> String {
        let hint: String = self.client_key.chars().take(CLIENT_KEY_HINT_LEN).collect();
        format!("{hint}…")
    }

    pub(crate) fn shared_secret(&self) -> &SecretString {
        &self.shared_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_key", &self.client_key_hint())
            .field("shared_secret", &"[REDACTED]")
            .finish()
    }
}

/// Decision endpoint variant the integration is provisioned for.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DecisionRoute {
    /// Human/hybrid review decisions under `/decision`.
    #[default]
    Standard,
    /// The Full Auto integration's `/decision/fullauto` endpoint.
    FullAuto,
}

impl DecisionRoute {
    pub(crate) fn path(self, session: &SessionId) -> String {
        match self {
            DecisionRoute::Standard => format!("v1/sessions/{session}/decision"),
            DecisionRoute::FullAuto => {
                format!("v1/sessions/{session}/decision/fullauto?version=1.0.0")
            }
        }
    }
}

/// Client configuration for one integration.
#[derive(Clone, Debug)]
pub struct VeriffConfig {
    pub base_url: Url,
    pub credentials: Credentials,
    /// HTTPS callback the provider requires on session creation.
    pub callback_url: Url,
    pub request_timeout: Duration,
    pub decision_route: DecisionRoute,
    pub poll: PollPolicy,
}

impl VeriffConfig {
    /// Builds a config against the production host with default timeouts and
    /// poll policy.
    pub fn new(credentials: Credentials, callback_url: Url) -> Result<Self> {
        if callback_url.scheme() != "https" {
            return Err(Error::validation(format!(
                "callback URL must be https, got `{callback_url}`"
            )));
        }

        Ok(VeriffConfig {
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            credentials,
            callback_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            decision_route: DecisionRoute::default(),
            poll: PollPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    #[must_use]
    pub fn with_decision_route(mut self, decision_route: DecisionRoute) -> Self {
        self.decision_route = decision_route;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Result<Self> {
        poll.validate()?;
        self.poll = poll;
        Ok(self)
    }
}
