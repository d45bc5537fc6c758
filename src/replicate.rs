use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::ai::{download, GeneratedImage, ImageGenerator};
use crate::error::ThumbnailError;
use crate::normalize::Size;
use crate::prompt::PromptVariant;

const REPLICATE_API: &str = "https://api.replicate.com/v1";
const REPLICATE_MODEL: &str = "google/imagen-3-fast";
const PREDICTION_TIMEOUT_SECS: u64 = 300;
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Imagen on Replicate. The model only takes an aspect ratio, so its output is
/// normalized to the exact target size like any other generator's.
pub(crate) struct ReplicateGenerator {
    http: reqwest::Client,
    api_token: String,
    base_url: String,
    poll_interval: Duration,
}

impl ReplicateGenerator {
    pub(crate) fn new(api_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_token: api_token.into(),
            base_url: REPLICATE_API.to_owned(),
            poll_interval: POLL_INTERVAL,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, url: impl Into<String>, poll_interval: Duration) -> Self {
        self.base_url = url.into();
        self.poll_interval = poll_interval;
        self
    }

    async fn create_prediction(
        &self,
        prompt: &str,
        target: Size,
    ) -> Result<Prediction, ThumbnailError> {
        let body = PredictionRequest {
            input: PredictionInput {
                prompt,
                aspect_ratio: aspect_ratio(target),
            },
        };

        log::debug!("Creating prediction on {REPLICATE_MODEL}");
        let response = self
            .http
            .post(format!("{}/models/{REPLICATE_MODEL}/predictions", self.base_url))
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
            .map_err(|e| ThumbnailError::ItemGeneration(e.to_string()))?;
        parse_prediction(response).await
    }

    async fn poll(&self, url: &str) -> Result<Prediction, ThumbnailError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| ThumbnailError::ItemGeneration(e.to_string()))?;
        parse_prediction(response).await
    }

    async fn run(&self, prompt: &str, target: Size) -> Result<String, ThumbnailError> {
        let mut prediction = self.create_prediction(prompt, target).await?;
        loop {
            let status = prediction.status.clone();
            match status.as_str() {
                "succeeded" => return prediction.output_url(),
                "failed" | "canceled" => {
                    let reason = prediction
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| status.clone());
                    return Err(ThumbnailError::ItemGeneration(format!(
                        "prediction {} {reason}",
                        prediction.id
                    )));
                }
                status => {
                    log::debug!("Prediction {} is {status}", prediction.id);
                    let url = prediction.urls.get.ok_or_else(|| {
                        ThumbnailError::ItemGeneration("prediction has no poll URL".into())
                    })?;
                    tokio::time::sleep(self.poll_interval).await;
                    prediction = self.poll(&url).await?;
                }
            }
        }
    }
}

#[async_trait]
impl ImageGenerator for ReplicateGenerator {
    fn name(&self) -> &str {
        "replicate"
    }

    fn prompt_variant(&self) -> PromptVariant {
        PromptVariant::Replicate
    }

    async fn generate(&self, prompt: &str, target: Size) -> Result<GeneratedImage, ThumbnailError> {
        let url = tokio::time::timeout(
            tokio::time::Duration::from_secs(PREDICTION_TIMEOUT_SECS),
            self.run(prompt, target),
        )
        .await
        .map_err(|_| ThumbnailError::ItemGeneration("Replicate prediction timed out".into()))??;

        Ok(GeneratedImage {
            bytes: download(&self.http, &url).await?,
            sized: false,
        })
    }
}

#[derive(Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
}

#[derive(Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    aspect_ratio: String,
}

/// `1080x1920` becomes `9:16`.
fn aspect_ratio(size: Size) -> String {
    fn gcd(a: u32, b: u32) -> u32 {
        if b == 0 {
            a
        } else {
            gcd(b, a % b)
        }
    }
    let divisor = gcd(size.width, size.height).max(1);
    format!("{}:{}", size.width / divisor, size.height / divisor)
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: PredictionUrls,
}

#[derive(Debug, Default, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

impl Prediction {
    // Models return either a single URL or a list of them.
    fn output_url(&self) -> Result<String, ThumbnailError> {
        let url = match &self.output {
            Some(Value::String(url)) => Some(url.clone()),
            Some(Value::Array(items)) => items.first().and_then(Value::as_str).map(str::to_owned),
            _ => None,
        };
        url.ok_or_else(|| {
            ThumbnailError::ItemGeneration(format!("prediction {} returned no image", self.id))
        })
    }
}

async fn parse_prediction(response: reqwest::Response) -> Result<Prediction, ThumbnailError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ThumbnailError::ItemGeneration(format!(
            "Replicate returned {status}: {body}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| ThumbnailError::ItemGeneration(format!("invalid prediction: {e}")))
}
