use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ThumbnailError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to fetch generated image: {0}")]
    ItemFetch(String),

    #[error("image generation failed: {0}")]
    ItemGeneration(String),

    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ThumbnailError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for ThumbnailError {
    fn from(e: reqwest::Error) -> Self {
        Self::ItemFetch(e.to_string())
    }
}

impl From<image::ImageError> for ThumbnailError {
    fn from(e: image::ImageError) -> Self {
        Self::UnreadableImage(e.to_string())
    }
}
