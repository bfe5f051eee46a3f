use crate::error::{Error, Result};
use crate::panel::session::{PanelSession, SessionFactory};
use async_trait::async_trait;
use serde_json::{Value, json};

/// Key under which the W3C protocol nests element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opens W3C WebDriver sessions against a remote automation endpoint.
///
/// The endpoint is the control-plane URL of a driver or Selenium node,
/// e.g. `http://localhost:4444`.
pub struct WebDriverFactory {
    http: reqwest::Client,
    endpoint: String,
}

impl WebDriverFactory {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn create(&self) -> Result<Box<dyn PanelSession>> {
        let body = json!({
            "capabilities": {
                "alwaysMatch": { "browserName": "firefox" }
            }
        });

        let value = execute(
            self.http
                .post(format!("{}/session", self.endpoint))
                .json(&body),
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Session("session response carried no sessionId".to_string()))?
            .to_string();

        tracing::debug!(session_id, "Opened WebDriver session");
        Ok(Box::new(WebDriverSession {
            http: self.http.clone(),
            base: format!("{}/session/{}", self.endpoint, session_id),
        }))
    }
}

/// One live WebDriver session, addressed as `{endpoint}/session/{id}`.
pub struct WebDriverSession {
    http: reqwest::Client,
    base: String,
}

impl WebDriverSession {
    /// Looks up an element by CSS selector and returns its protocol
    /// reference.
    async fn find_element(&self, selector: &str) -> Result<String> {
        let body = json!({ "using": "css selector", "value": selector });
        let value =
            execute(self.http.post(format!("{}/element", self.base)).json(&body)).await?;

        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Session(format!("element response carried no reference: {}", selector))
            })
    }
}

/// Sends one WebDriver command and unwraps the `value` field, mapping
/// protocol error envelopes to [`Error::Session`].
async fn execute(request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::Session(format!("webdriver request failed: {}", e)))?;

    let status = response.status();
    let mut body: Value = response
        .json()
        .await
        .map_err(|e| Error::Session(format!("webdriver response was not JSON: {}", e)))?;

    let value = body.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if !status.is_success() {
        let detail = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(Error::Session(format!(
            "webdriver command failed ({}): {} {}",
            status, detail, message
        )));
    }

    Ok(value)
}

#[async_trait]
impl PanelSession for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        execute(
            self.http
                .post(format!("{}/url", self.base))
                .json(&json!({ "url": url })),
        )
        .await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        let value = execute(self.http.get(format!("{}/url", self.base))).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Session("current URL was not a string".to_string()))
    }

    async fn page_source(&mut self) -> Result<String> {
        let value = execute(self.http.get(format!("{}/source", self.base))).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Session("page source was not a string".to_string()))
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<()> {
        let element = self.find_element(selector).await?;
        execute(
            self.http
                .post(format!("{}/element/{}/value", self.base, element))
                .json(&json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let element = self.find_element(selector).await?;
        execute(
            self.http
                .post(format!("{}/element/{}/click", self.base, element))
                .json(&json!({})),
        )
        .await?;
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        execute(self.http.delete(self.base.clone())).await?;
        Ok(())
    }
}
