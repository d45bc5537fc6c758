use async_openai::config::OpenAIConfig;
use async_openai::types::{
    CreateImageRequestArgs, Image, ImageModel, ImageQuality, ImageResponseFormat, ImageSize,
};
use async_openai::Client;
use async_trait::async_trait;
use base64::Engine;

use crate::error::ThumbnailError;
use crate::normalize::Size;
use crate::prompt::PromptVariant;

const OPENAI_TIMEOUT_SECS: u64 = 300;

/// Image bytes returned by a generator.
#[derive(Debug)]
pub(crate) struct GeneratedImage {
    pub(crate) bytes: Vec<u8>,
    /// The upstream call already produced exactly the requested size.
    pub(crate) sized: bool,
}

#[async_trait]
pub(crate) trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn prompt_variant(&self) -> PromptVariant;

    async fn generate(&self, prompt: &str, target: Size)
        -> Result<GeneratedImage, ThumbnailError>;
}

pub(crate) async fn download(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, ThumbnailError> {
    log::debug!("Downloading {url}");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ThumbnailError::ItemFetch(format!("{url} returned {status}")));
    }
    Ok(response.bytes().await?.to_vec())
}

/// DALL-E 3 through the OpenAI images endpoint. Portrait output is 1024x1792,
/// so results always need normalizing.
pub(crate) struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    http: reqwest::Client,
}

impl OpenAiGenerator {
    pub(crate) fn new(api_key: &str) -> Self {
        Self {
            client: Client::with_config(OpenAIConfig::new().with_api_key(api_key)),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ImageGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    fn prompt_variant(&self) -> PromptVariant {
        PromptVariant::OpenAi
    }

    async fn generate(
        &self,
        prompt: &str,
        _target: Size,
    ) -> Result<GeneratedImage, ThumbnailError> {
        let request = CreateImageRequestArgs::default()
            .model(ImageModel::DallE3)
            .prompt(prompt)
            .size(ImageSize::S1024x1792)
            .quality(ImageQuality::Standard)
            .response_format(ImageResponseFormat::Url)
            .n(1)
            .build()
            .map_err(|e| ThumbnailError::ItemGeneration(e.to_string()))?;

        let response = tokio::time::timeout(
            tokio::time::Duration::from_secs(OPENAI_TIMEOUT_SECS),
            self.client.images().create(request),
        )
        .await
        .map_err(|_| ThumbnailError::ItemGeneration("OpenAI request timed out".into()))?
        .map_err(|e| ThumbnailError::ItemGeneration(e.to_string()))?;

        let image = response
            .data
            .first()
            .ok_or(ThumbnailError::ItemGeneration(
                "No image in response from OpenAI".into(),
            ))?;

        let bytes = match &**image {
            Image::Url {
                url,
                revised_prompt,
            } => {
                if let Some(revised) = revised_prompt {
                    log::debug!("OpenAI revised prompt: {revised}");
                }
                download(&self.http, url).await?
            }
            Image::B64Json {
                b64_json,
                revised_prompt,
            } => {
                if let Some(revised) = revised_prompt {
                    log::debug!("OpenAI revised prompt: {revised}");
                }
                base64::prelude::BASE64_STANDARD
                    .decode(b64_json.as_bytes())
                    .map_err(|e| ThumbnailError::UnreadableImage(e.to_string()))?
            }
        };

        Ok(GeneratedImage {
            bytes,
            sized: false,
        })
    }
}
