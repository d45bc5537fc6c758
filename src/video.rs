use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ThumbnailError;

const VIDEO_EXTENSION: &str = "mp4";

/// Lists the `.mp4` files directly inside `videos_dir`, sorted by path.
pub(crate) fn find_videos(videos_dir: &Path) -> Result<Vec<PathBuf>, ThumbnailError> {
    if !videos_dir.is_dir() {
        log::warn!("Videos directory {} does not exist", videos_dir.display());
        return Ok(Vec::new());
    }

    let mut videos = Vec::new();
    for entry in fs::read_dir(videos_dir).map_err(|e| ThumbnailError::io(videos_dir, e))? {
        let path = entry.map_err(|e| ThumbnailError::io(videos_dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == VIDEO_EXTENSION) {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

/// Where the thumbnail for `video_path` lives inside `thumbnails_dir`.
pub(crate) fn thumbnail_path(thumbnails_dir: &Path, video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    thumbnails_dir.join(format!("{stem}.png"))
}
