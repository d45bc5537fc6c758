mod ai;
mod config;
mod error;
mod normalize;
mod prompt;
mod replicate;
#[cfg(test)]
mod test_support;
mod thumbnails;
mod title;
mod video;

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::config::{Provider, Settings};
use crate::thumbnails::RunOptions;

#[derive(Parser)]
#[command(name = "thumbgen")]
#[command(about = "Generate vertical video thumbnails with a text-to-image model", long_about = None)]
struct Cli {
    /// API key for the selected provider (falls back to its environment variable)
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long, value_enum, default_value_t = Provider::Openai)]
    provider: Provider,
    #[arg(long, default_value = "sample_data/videos")]
    videos_dir: PathBuf,
    #[arg(long, default_value = "sample_data/thumbnails")]
    thumbnails_dir: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cancel = CancellationToken::new();
    listen_for_interrupt(cancel.clone())?;

    let cli = Cli::parse();
    config::load_environment()?;

    let settings = Settings::resolve(
        cli.provider,
        cli.api_key,
        std::env::var(cli.provider.credential_var()).ok(),
        cli.videos_dir,
        cli.thumbnails_dir,
    )?;

    fs::create_dir_all(&settings.thumbnails_dir)?;
    let videos = video::find_videos(&settings.videos_dir)?;
    if videos.is_empty() {
        println!("No .mp4 files found in {}", settings.videos_dir.display());
        return Ok(());
    }
    println!("Found {} videos", videos.len());

    let generator = settings.provider.generator(&settings.credential);
    log::info!("Using {} image generator", generator.name());

    let options = RunOptions {
        thumbnails_dir: &settings.thumbnails_dir,
        target: settings.target,
        delay: settings.delay,
    };
    let summary = thumbnails::generate_thumbnails(generator.as_ref(), &videos, &options, &cancel).await;

    log::info!(
        "{} generated, {} skipped, {} failed",
        summary.generated,
        summary.skipped,
        summary.failed
    );
    if !summary.interrupted {
        println!("\nThumbnail generation complete!");
    }

    Ok(())
}

/// Cancels `cancel` on Ctrl-C. On unix the handler is registered before this
/// returns, so an early interrupt never falls through to the default handler.
fn listen_for_interrupt(cancel: CancellationToken) -> std::io::Result<()> {
    #[cfg(unix)]
    let mut interrupt =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    tokio::spawn(async move {
        #[cfg(unix)]
        let received = interrupt.recv().await.is_some();
        #[cfg(not(unix))]
        let received = tokio::signal::ctrl_c().await.is_ok();

        if received {
            println!("\n\nGracefully stopping... (This might take a few seconds)");
            cancel.cancel();
        }
    });
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn interrupt_cancels_instead_of_killing_the_process() {
        let cancel = CancellationToken::new();
        listen_for_interrupt(cancel.clone()).unwrap();

        let status = std::process::Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(std::time::Duration::from_secs(5), cancel.cancelled())
            .await
            .unwrap();
    }
}
