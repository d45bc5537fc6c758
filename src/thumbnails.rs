use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::ai::ImageGenerator;
use crate::error::ThumbnailError;
use crate::normalize::{self, Size};
use crate::prompt::build_prompt;
use crate::title::video_title;
use crate::video::thumbnail_path;

pub(crate) struct RunOptions<'a> {
    pub(crate) thumbnails_dir: &'a Path,
    pub(crate) target: Size,
    /// Pause after each generated thumbnail.
    pub(crate) delay: Duration,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) generated: usize,
    pub(crate) skipped: usize,
    pub(crate) failed: usize,
    pub(crate) interrupted: bool,
}

enum Outcome {
    Generated,
    Skipped,
}

/// Generates a thumbnail for every video that does not have one yet.
///
/// Items are processed one at a time. A failing item is logged and counted,
/// and the run moves on. Cancelling `cancel` stops the run before the next
/// item, or abandons the in-flight item without writing anything.
pub(crate) async fn generate_thumbnails(
    generator: &dyn ImageGenerator,
    videos: &[PathBuf],
    options: &RunOptions<'_>,
    cancel: &CancellationToken,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for video_path in videos {
        if cancel.is_cancelled() {
            summary.interrupted = true;
            break;
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                summary.interrupted = true;
                break;
            }
            result = generate_one(generator, video_path, options) => result,
        };

        match result {
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Ok(Outcome::Generated) => {
                summary.generated += 1;
                tokio::select! {
                    _ = cancel.cancelled() => {
                        summary.interrupted = true;
                        break;
                    }
                    _ = tokio::time::sleep(options.delay) => {}
                }
            }
            Err(e) => {
                log::error!(
                    "Error generating thumbnail for {}: {e}",
                    video_path.display()
                );
                summary.failed += 1;
            }
        }
    }

    summary
}

async fn generate_one(
    generator: &dyn ImageGenerator,
    video_path: &Path,
    options: &RunOptions<'_>,
) -> Result<Outcome, ThumbnailError> {
    let output_path = thumbnail_path(options.thumbnails_dir, video_path);
    if output_path.exists() {
        log::info!(
            "Skipping {} - thumbnail already exists",
            output_path.file_stem().unwrap_or_default().to_string_lossy()
        );
        return Ok(Outcome::Skipped);
    }

    let title = video_title(video_path);
    let prompt = build_prompt(&title, generator.prompt_variant());
    log::info!("Generating thumbnail for: {title}");
    log::debug!("Prompt for {title} via {}: {prompt}", generator.name());

    let generated = generator.generate(&prompt, options.target).await?;
    let png_data = if generated.sized {
        generated.bytes
    } else {
        let image = normalize::normalize(&generated.bytes, options.target)?;
        normalize::encode_png(&image)?
    };

    if !persist(&output_path, &png_data)? {
        log::info!("Skipping {title} - thumbnail appeared while generating");
        return Ok(Outcome::Skipped);
    }
    log::info!("✓ Generated thumbnail for {title}");
    Ok(Outcome::Generated)
}

// Written to a temp file next to the target and linked into place, so an
// interrupted run never leaves a truncated thumbnail behind. Returns false when
// the thumbnail already exists; an existing file is never replaced.
fn persist(output_path: &Path, data: &[u8]) -> Result<bool, ThumbnailError> {
    let dir = output_path.parent().unwrap_or(Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| ThumbnailError::io(dir, e))?;
    file.write_all(data)
        .map_err(|e| ThumbnailError::io(file.path().to_path_buf(), e))?;
    match file.persist_noclobber(output_path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(ThumbnailError::io(output_path, e.error)),
    }
}
