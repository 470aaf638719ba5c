use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{
    multipart::{Form, Part},
    Client,
};

use crate::settings::GameSettings;

use super::{ClassificationResult, Classifier};

/// Uploads drawings to the art-style classification endpoint as a multipart
/// `file` field and decodes the JSON prediction.
#[derive(Clone)]
pub struct HttpClassifier {
    http: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build classifier HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            auth_token,
        })
    }

    pub fn from_settings(settings: &GameSettings) -> Result<Self> {
        Self::new(
            settings.classifier_url.clone(),
            settings.auth_token.clone(),
            Duration::from_secs(settings.request_timeout_secs.max(1)),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, png: Vec<u8>, file_name: &str) -> Result<ClassificationResult> {
        let part = Part::bytes(png)
            .file_name(file_name.to_string())
            .mime_str("image/png")
            .context("invalid upload mime type")?;
        let form = Form::new().part("file", part);

        let mut request = self.http.post(&self.endpoint).multipart(form);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        debug!("submitting {file_name} to {}", self.endpoint);
        let response = request
            .send()
            .await
            .with_context(|| format!("classifier request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("classifier returned {status}: {body}"));
        }

        response
            .json::<ClassificationResult>()
            .await
            .context("failed to decode classifier response")
    }
}
