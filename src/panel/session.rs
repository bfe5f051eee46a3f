use crate::error::{Error, Result};
use crate::server::RestartTarget;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Landing page of the panel's identity provider. Navigating here while
/// already authenticated redirects away from the login form.
const LOGIN_URL: &str = "https://id.g-portal.com/login";
/// URL fragment that identifies the login form.
const LOGIN_URL_MARKER: &str = "/login";
/// Cookie-consent accept control; clicking it is best-effort.
const COOKIE_ACCEPT_SELECTOR: &str = "#CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll";
/// Credential form fields and submit control.
const USERNAME_SELECTOR: &str = "input[name=\"login\"]";
const PASSWORD_SELECTOR: &str = "input[name=\"password\"]";
const LOGIN_SUBMIT_SELECTOR: &str = "button[type=\"submit\"]";

/// A restart via direct URL succeeds when the browser ends up on the
/// restart endpoint itself.
const RESTART_SUCCESS_SUFFIX: &str = "restartService";
/// Alternate backend: service dashboard page and its restart control.
const SERVICE_PAGE_BASE: &str = "https://www.g-portal.com/int/server";
const SERVICE_RESTART_SELECTOR: &str = "button[data-action=\"restart\"]";
/// Marker expected in the page after a successful service restart.
const SERVICE_SUCCESS_MARKER: &str = "home";

/// A session handle older than this is disposed on the next release.
const SESSION_MAX_AGE: Duration = Duration::from_secs(300);

/// One live browser-automation session against the panel.
///
/// The restart protocol only needs navigation, element lookup by CSS
/// selector, text input, and clicks; anything richer (script execution,
/// frames) is deliberately outside the trait so fakes stay trivial.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PanelSession: Send {
    /// Navigates to `url`.
    async fn goto(&mut self, url: &str) -> Result<()>;
    /// Returns the URL the browser currently shows.
    async fn current_url(&mut self) -> Result<String>;
    /// Returns the current page's markup.
    async fn page_source(&mut self) -> Result<String>;
    /// Types `text` into the element matching `selector`.
    async fn fill(&mut self, selector: &str, text: &str) -> Result<()>;
    /// Clicks the element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<()>;
    /// Ends the session, releasing the remote browser.
    async fn quit(&mut self) -> Result<()>;
}

/// Opens fresh [`PanelSession`]s on demand.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn PanelSession>>;
}

/// Seam between the monitors and the shared restart resource.
#[async_trait]
pub trait PanelRestarter: Send + Sync {
    /// Performs one authenticated restart of `target`. `server_name` is
    /// only used for logging.
    async fn restart(&self, server_name: &str, target: &RestartTarget) -> Result<()>;
}

/// Panel account used for every restart.
#[derive(Debug, Clone)]
pub struct PanelCredentials {
    pub user: String,
    pub password: String,
}

/// The shared session slot. Lazily filled on first use, recycled when the
/// handle outlives [`SESSION_MAX_AGE`].
struct SessionSlot {
    session: Option<Box<dyn PanelSession>>,
    created_at: Option<Instant>,
}

/// Serialized client for the panel's restart actions.
///
/// All monitored servers share one authenticated panel identity, and a
/// browser session races on navigation state if driven from two tasks at
/// once. The entire create-if-absent → authenticate → act → recycle
/// sequence therefore runs under a single process-wide mutex; restarts are
/// rare, so the serialization is free in practice.
pub struct RestartClient {
    factory: Arc<dyn SessionFactory>,
    credentials: PanelCredentials,
    max_session_age: Duration,
    slot: Mutex<SessionSlot>,
}

impl RestartClient {
    /// Creates a client with the production session-expiry window.
    pub fn new(factory: Arc<dyn SessionFactory>, credentials: PanelCredentials) -> Self {
        Self::with_max_session_age(factory, credentials, SESSION_MAX_AGE)
    }

    /// Creates a client with a custom session-expiry window (used by
    /// tests).
    pub fn with_max_session_age(
        factory: Arc<dyn SessionFactory>,
        credentials: PanelCredentials,
        max_session_age: Duration,
    ) -> Self {
        Self {
            factory,
            credentials,
            max_session_age,
            slot: Mutex::new(SessionSlot {
                session: None,
                created_at: None,
            }),
        }
    }

    /// Restarts `target` through the panel.
    ///
    /// Holds the session lock for the whole protocol, then age-checks the
    /// handle before returning — disposal failures are logged and
    /// swallowed so a broken handle can never wedge the slot.
    #[tracing::instrument(skip_all, fields(server_name = %server_name))]
    pub async fn restart(&self, server_name: &str, target: &RestartTarget) -> Result<()> {
        let mut slot = self.slot.lock().await;
        let outcome = self.perform_restart(&mut slot, target).await;
        Self::recycle(&mut slot, self.max_session_age).await;
        outcome
    }

    async fn perform_restart(&self, slot: &mut SessionSlot, target: &RestartTarget) -> Result<()> {
        if slot.session.is_none() {
            tracing::debug!("Opening new automation session");
            let session = self.factory.create().await?;
            slot.session = Some(session);
            slot.created_at = Some(Instant::now());
        }

        let session = slot
            .session
            .as_mut()
            .ok_or_else(|| Error::Session("session slot empty after creation".to_string()))?;

        self.authenticate(&mut **session).await?;

        match target {
            RestartTarget::PanelUrl(url) => {
                session.goto(url).await?;
                let destination = session.current_url().await?;
                if !destination.ends_with(RESTART_SUCCESS_SUFFIX) {
                    return Err(Error::RestartFailed(format!(
                        "unexpected destination after restart: {}",
                        destination
                    )));
                }
            }
            RestartTarget::ServiceId(service_id) => {
                session
                    .goto(&format!("{}/{}", SERVICE_PAGE_BASE, service_id))
                    .await?;
                session.click(SERVICE_RESTART_SELECTOR).await?;
                let source = session.page_source().await?;
                if !source.contains(SERVICE_SUCCESS_MARKER) {
                    return Err(Error::RestartFailed(
                        "service page did not confirm the restart".to_string(),
                    ));
                }
            }
        }

        tracing::info!("Restart action accepted by the panel");
        Ok(())
    }

    /// Navigates to the login landing page and authenticates if the panel
    /// did not redirect us past the form already.
    async fn authenticate(&self, session: &mut dyn PanelSession) -> Result<()> {
        session.goto(LOGIN_URL).await?;
        let landing = session.current_url().await?;
        if !landing.contains(LOGIN_URL_MARKER) {
            tracing::debug!("Existing panel session still authenticated");
            return Ok(());
        }

        // The consent dialog only shows up for fresh browser profiles.
        if let Err(e) = session.click(COOKIE_ACCEPT_SELECTOR).await {
            tracing::debug!(error = %e, "No cookie consent control to dismiss");
        }

        session.fill(USERNAME_SELECTOR, &self.credentials.user).await?;
        session
            .fill(PASSWORD_SELECTOR, &self.credentials.password)
            .await?;
        session.click(LOGIN_SUBMIT_SELECTOR).await?;

        let destination = session.current_url().await?;
        if destination.contains(LOGIN_URL_MARKER) {
            return Err(Error::LoginFailed(format!(
                "still on the login page: {}",
                destination
            )));
        }

        tracing::debug!("Panel login successful");
        Ok(())
    }

    /// Disposes the session if it has outlived the expiry window. Runs
    /// under the same lock as the restart protocol, so a disposal never
    /// overlaps an authenticate-and-act sequence.
    async fn recycle(slot: &mut SessionSlot, max_session_age: Duration) {
        let stale = slot
            .created_at
            .is_some_and(|created_at| created_at.elapsed() >= max_session_age);
        if !stale {
            return;
        }

        if let Some(mut session) = slot.session.take() {
            tracing::debug!("Disposing stale automation session");
            if let Err(e) = session.quit().await {
                tracing::warn!(error = %e, "Failed to dispose automation session");
            }
        }
        slot.created_at = None;
    }
}

#[async_trait]
impl PanelRestarter for RestartClient {
    async fn restart(&self, server_name: &str, target: &RestartTarget) -> Result<()> {
        RestartClient::restart(self, server_name, target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn credentials() -> PanelCredentials {
        PanelCredentials {
            user: "ops@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    fn client_with_session(session: MockPanelSession) -> RestartClient {
        let mut factory = MockSessionFactory::new();
        let mut session = Some(session);
        factory
            .expect_create()
            .times(1)
            .returning(move || Ok(Box::new(session.take().unwrap())));
        RestartClient::new(Arc::new(factory), credentials())
    }

    #[tokio::test]
    async fn test_login_skipped_when_already_authenticated() {
        let mut session = MockPanelSession::new();
        session
            .expect_goto()
            .with(eq(LOGIN_URL))
            .times(1)
            .returning(|_| Ok(()));
        // Landing away from the login form means the cookie/credential
        // steps must not run at all.
        session
            .expect_current_url()
            .times(1)
            .returning(|| Ok("https://www.g-portal.com/int/home".to_string()));
        session.expect_fill().times(0);
        session
            .expect_goto()
            .with(eq("https://panel.example/1/restartService"))
            .times(1)
            .returning(|_| Ok(()));
        session
            .expect_current_url()
            .times(1)
            .returning(|| Ok("https://panel.example/1/restartService".to_string()));

        let client = client_with_session(session);
        let target = RestartTarget::PanelUrl("https://panel.example/1/restartService".to_string());
        assert!(client.restart("srv", &target).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failure_is_reported_as_login_failed() {
        let mut session = MockPanelSession::new();
        session.expect_goto().returning(|_| Ok(()));
        // Both before and after submitting we are stuck on the form.
        session
            .expect_current_url()
            .returning(|| Ok("https://id.g-portal.com/login?error=1".to_string()));
        session.expect_click().returning(|_| Ok(()));
        session.expect_fill().returning(|_, _| Ok(()));

        let client = client_with_session(session);
        let target = RestartTarget::PanelUrl("https://panel.example/1/restartService".to_string());
        let err = client.restart("srv", &target).await.unwrap_err();
        assert!(matches!(err, Error::LoginFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_cookie_consent_is_tolerated() {
        let mut session = MockPanelSession::new();
        session.expect_goto().returning(|_| Ok(()));

        let mut urls = vec![
            "https://id.g-portal.com/login".to_string(),
            "https://www.g-portal.com/int/home".to_string(),
            "https://panel.example/1/restartService".to_string(),
        ]
        .into_iter();
        session
            .expect_current_url()
            .times(3)
            .returning(move || Ok(urls.next().unwrap()));

        session
            .expect_click()
            .with(eq(COOKIE_ACCEPT_SELECTOR))
            .times(1)
            .returning(|_| Err(Error::Session("no such element".to_string())));
        session
            .expect_click()
            .with(eq(LOGIN_SUBMIT_SELECTOR))
            .times(1)
            .returning(|_| Ok(()));
        session.expect_fill().times(2).returning(|_, _| Ok(()));

        let client = client_with_session(session);
        let target = RestartTarget::PanelUrl("https://panel.example/1/restartService".to_string());
        assert!(client.restart("srv", &target).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_destination_is_restart_failed() {
        let mut session = MockPanelSession::new();
        session.expect_goto().returning(|_| Ok(()));

        let mut urls = vec![
            "https://www.g-portal.com/int/home".to_string(),
            "https://www.g-portal.com/int/error".to_string(),
        ]
        .into_iter();
        session
            .expect_current_url()
            .times(2)
            .returning(move || Ok(urls.next().unwrap()));

        let client = client_with_session(session);
        let target = RestartTarget::PanelUrl("https://panel.example/1/restartService".to_string());
        let err = client.restart("srv", &target).await.unwrap_err();
        assert!(matches!(err, Error::RestartFailed(_)));
    }

    #[tokio::test]
    async fn test_service_backend_clicks_and_checks_marker() {
        let mut session = MockPanelSession::new();
        session.expect_goto().returning(|_| Ok(()));
        session
            .expect_current_url()
            .times(1)
            .returning(|| Ok("https://www.g-portal.com/int/home".to_string()));
        session
            .expect_click()
            .with(eq(SERVICE_RESTART_SELECTOR))
            .times(1)
            .returning(|_| Ok(()));
        session
            .expect_page_source()
            .times(1)
            .returning(|| Ok("<html><body>home</body></html>".to_string()));

        let client = client_with_session(session);
        assert!(
            client
                .restart("srv", &RestartTarget::ServiceId(1337))
                .await
                .is_ok()
        );
    }
}
