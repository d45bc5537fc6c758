use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::{ImageGenerator, OpenAiGenerator};
use crate::error::ThumbnailError;
use crate::normalize::Size;
use crate::replicate::ReplicateGenerator;

pub(crate) const TARGET_SIZE: Size = Size::new(1080, 1920);
pub(crate) const ITEM_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Provider {
    /// DALL-E 3, cropped and resized locally
    Openai,
    /// Imagen 3 Fast on Replicate at the target aspect ratio, resized locally
    Replicate,
}

impl Provider {
    pub(crate) fn credential_var(self) -> &'static str {
        match self {
            Provider::Openai => "OPENAI_API_KEY",
            Provider::Replicate => "REPLICATE_API_TOKEN",
        }
    }

    pub(crate) fn generator(self, credential: &str) -> Box<dyn ImageGenerator> {
        match self {
            Provider::Openai => Box::new(OpenAiGenerator::new(credential)),
            Provider::Replicate => Box::new(ReplicateGenerator::new(credential)),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) provider: Provider,
    pub(crate) credential: String,
    pub(crate) videos_dir: PathBuf,
    pub(crate) thumbnails_dir: PathBuf,
    pub(crate) target: Size,
    pub(crate) delay: Duration,
}

impl Settings {
    /// The command-line key wins over the provider's environment variable.
    pub(crate) fn resolve(
        provider: Provider,
        api_key: Option<String>,
        env_credential: Option<String>,
        videos_dir: PathBuf,
        thumbnails_dir: PathBuf,
    ) -> Result<Self, ThumbnailError> {
        let non_blank = |key: &String| !key.trim().is_empty();
        let credential = api_key
            .filter(non_blank)
            .or(env_credential.filter(non_blank))
            .ok_or_else(|| {
                ThumbnailError::Configuration(format!(
                    "API key must be provided via --api-key or {} in the environment or .env file",
                    provider.credential_var()
                ))
            })?;

        Ok(Self {
            provider,
            credential,
            videos_dir,
            thumbnails_dir,
            target: TARGET_SIZE,
            delay: ITEM_DELAY,
        })
    }
}

/// Loads `.env` from the working directory (or a parent), falling back to one
/// next to the executable. Variables already set in the environment win.
pub(crate) fn load_environment() -> anyhow::Result<()> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match load_dotenv(exe_dir.as_deref())? {
        Some(path) => log::info!("Loaded environment variables from {}", path.display()),
        None => log::warn!("No .env file found. Using system environment variables."),
    }
    Ok(())
}

fn load_dotenv(fallback_dir: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    match dotenv::dotenv() {
        Ok(path) => return Ok(Some(path)),
        Err(e) if !e.not_found() => return Err(e.into()),
        Err(_) => {}
    }
    match fallback_dir {
        Some(dir) => load_dotenv_in(dir),
        None => Ok(None),
    }
}

fn load_dotenv_in(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(None);
    }
    dotenv::from_path(&path)?;
    Ok(Some(path))
}
