//! Session driver for the remote plate query surface
//!
//! One [`PlateSession`] wraps one disposable browser session. The query loop
//! only sees the [`SessionProvider`]/[`PlateSession`] traits; the WebDriver
//! plumbing lives entirely in this module, including the tokio runtime that
//! thirtyfour needs. The rest of the crate stays synchronous.

use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};
use tokio::runtime::Runtime;

/// Element id of the plate input field on the query page
const PLATE_INPUT_ID: &str = "plate-number-line-1";
/// Element id of the submit button
const SUBMIT_BUTTON_ID: &str = "check-availability";
/// Element id of the region the availability text is rendered into
const RESULT_REGION_ID: &str = "plate-availability-result";

/// Poll interval for bounded element waits
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Headless Chrome reports `navigator.webdriver = true`; real browsers don't.
const MASK_WEBDRIVER_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Options for one session against the query surface.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebDriver endpoint (chromedriver)
    pub webdriver_url: String,
    /// Entry point of the plate query surface
    pub entry_url: String,
    /// Suppress the visible browser window
    pub headless: bool,
    /// Maximum wait per element/navigation operation
    pub timeout: Duration,
    /// User agent override
    pub user_agent: Option<String>,
}

/// Failure signals a session can produce. The retry policy depends on
/// telling these apart, so they are distinct variants rather than one
/// opaque error.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The environment cannot produce a session at all
    #[error("could not establish a session: {0}")]
    Launch(String),

    /// The page was reached but the response never appeared in time
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// An expected UI element is absent; the page layout has likely changed
    #[error("expected page element missing: {0}")]
    ElementNotFound(String),

    /// Any other mid-session protocol failure
    #[error("session protocol failure: {0}")]
    Protocol(String),
}

impl SessionError {
    /// Whether a fresh session may succeed where this one failed
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Timeout(_) | SessionError::ElementNotFound(_))
    }
}

/// One live session against the query surface
pub trait PlateSession {
    /// Navigate to the query page, enter the normalized plate, submit, and
    /// read back the availability text.
    fn submit(&mut self, plate: &str) -> Result<String, SessionError>;

    /// Release the session. Idempotent; never fails.
    fn close(&mut self);
}

/// Opens sessions. The query loop acquires a fresh session per attempt.
pub trait SessionProvider {
    type Session: PlateSession;

    fn open(&self) -> Result<Self::Session, SessionError>;
}

/// [`SessionProvider`] backed by a chromedriver endpoint
pub struct WebDriverProvider {
    config: SessionConfig,
}

impl WebDriverProvider {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

impl SessionProvider for WebDriverProvider {
    type Session = WebDriverSession;

    fn open(&self) -> Result<WebDriverSession, SessionError> {
        WebDriverSession::open(&self.config)
    }
}

/// One live browser session, released on [`close`](PlateSession::close) or drop
pub struct WebDriverSession {
    runtime: Runtime,
    driver: Option<WebDriver>,
    entry_url: String,
    timeout: Duration,
}

impl WebDriverSession {
    fn open(config: &SessionConfig) -> Result<Self, SessionError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SessionError::Launch(format!("tokio runtime: {}", e)))?;

        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            add_arg(&mut caps, "--headless=new")?;
        }
        for arg in [
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--window-size=1920,1080",
            "--disable-blink-features=AutomationControlled",
        ] {
            add_arg(&mut caps, arg)?;
        }
        if let Some(ref agent) = config.user_agent {
            add_arg(&mut caps, &format!("--user-agent={}", agent))?;
        }

        info!("launching webdriver session via {}", config.webdriver_url);
        let driver = runtime
            .block_on(WebDriver::new(&config.webdriver_url, caps))
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        Ok(Self {
            runtime,
            driver: Some(driver),
            entry_url: config.entry_url.clone(),
            timeout: config.timeout,
        })
    }
}

impl PlateSession for WebDriverSession {
    fn submit(&mut self, plate: &str) -> Result<String, SessionError> {
        let driver = self
            .driver
            .as_ref()
            .ok_or_else(|| SessionError::Protocol("session already closed".to_string()))?;
        let timeout = self.timeout;
        let entry_url = self.entry_url.as_str();

        self.runtime.block_on(async {
            debug!("navigating to {}", entry_url);
            driver
                .goto(entry_url)
                .await
                .map_err(|e| SessionError::Protocol(format!("navigation failed: {}", e)))?;

            if let Err(e) = driver.execute(MASK_WEBDRIVER_JS, Vec::new()).await {
                debug!("webdriver masking script failed: {}", e);
            }

            let input = driver
                .query(By::Id(PLATE_INPUT_ID))
                .wait(timeout, POLL_INTERVAL)
                .first()
                .await
                .map_err(|_| {
                    SessionError::ElementNotFound(format!("plate input #{}", PLATE_INPUT_ID))
                })?;
            input.clear().await.map_err(protocol)?;
            input.send_keys(plate).await.map_err(protocol)?;

            let button = driver
                .query(By::Id(SUBMIT_BUTTON_ID))
                .wait(timeout, POLL_INTERVAL)
                .first()
                .await
                .map_err(|_| {
                    SessionError::ElementNotFound(format!("search button #{}", SUBMIT_BUTTON_ID))
                })?;
            button.click().await.map_err(protocol)?;

            debug!("waiting for availability result");
            let region = driver
                .query(By::Id(RESULT_REGION_ID))
                .wait(timeout, POLL_INTERVAL)
                .first()
                .await
                .map_err(|_| {
                    SessionError::Timeout(format!("availability result #{}", RESULT_REGION_ID))
                })?;
            let text = region.text().await.map_err(protocol)?;

            Ok(text.trim().to_string())
        })
    }

    fn close(&mut self) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = self.runtime.block_on(driver.quit()) {
                warn!("webdriver session did not shut down cleanly: {}", e);
            }
        }
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn add_arg(caps: &mut ChromeCapabilities, arg: &str) -> Result<(), SessionError> {
    caps.add_arg(arg)
        .map_err(|e| SessionError::Launch(format!("chrome capabilities: {}", e)))
}

fn protocol(e: WebDriverError) -> SessionError {
    SessionError::Protocol(e.to_string())
}
