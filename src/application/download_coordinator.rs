use std::path::{Path, PathBuf};

use futures::{stream::BoxStream, StreamExt};
use url::Url;

use crate::{
    domain::{AppError, FormatChoice, VideoAnalysis},
    extractor::{ExtractorClient, ExtractorEvent},
};

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// Percent in 0..=100 and the extractor's own rendering of it
    Progress { percent: f32, label: String },
    /// A file finished downloading; audio and video may still be merged
    Merging,
    Completed,
    Failed(AppError),
}

#[derive(Debug, Clone)]
pub struct DownloadCoordinator {
    extractor: ExtractorClient,
}

impl DownloadCoordinator {
    pub fn new(extractor: ExtractorClient) -> Self {
        Self { extractor }
    }

    pub async fn analyze(&self, url: String) -> Result<VideoAnalysis, AppError> {
        let url = normalize_url(&url)?;
        tracing::info!(%url, extractor = self.extractor.program(), "analyzing video");

        let info = self
            .extractor
            .analyze(&url)
            .await
            .map_err(|e| AppError::Extractor(e.to_string()))?;

        Ok(VideoAnalysis::from_info(url, info))
    }

    pub async fn choose_directory(&self, initial: PathBuf) -> Option<PathBuf> {
        let mut dialog = rfd::AsyncFileDialog::new();
        if initial.is_dir() {
            dialog = dialog.set_directory(&initial);
        }

        dialog
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    pub fn download_stream(
        &self,
        url: String,
        directory: PathBuf,
        choice: FormatChoice,
    ) -> BoxStream<'static, DownloadEvent> {
        let format = choice.format_expression();
        let template = directory.join(OUTPUT_TEMPLATE);
        tracing::info!(%url, %format, directory = %directory.display(), "starting download");

        self.extractor
            .download(&url, &template, &format)
            .map(|event| match event {
                ExtractorEvent::Downloading {
                    percent,
                    percent_text,
                } => DownloadEvent::Progress {
                    percent,
                    label: percent_text,
                },
                ExtractorEvent::FileFinished | ExtractorEvent::Merging => DownloadEvent::Merging,
                ExtractorEvent::Exited(Ok(())) => DownloadEvent::Completed,
                ExtractorEvent::Exited(Err(e)) => {
                    tracing::warn!("download failed: {}", e);
                    DownloadEvent::Failed(AppError::Extractor(e))
                }
            })
            .boxed()
    }
}

/// Trimmed input, with `https://` added to links pasted without a scheme.
/// Anything else (bare video IDs, `ytsearch:` queries) goes to the extractor
/// untouched and it reports what it cannot handle.
pub fn normalize_url(input: &str) -> Result<String, AppError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::EmptyUrl);
    }

    if Url::parse(input).is_ok() || !looks_like_host_path(input) {
        return Ok(input.to_string());
    }

    let with_scheme = format!("https://{}", input);
    match Url::parse(&with_scheme) {
        Ok(url) if url.has_host() => Ok(with_scheme),
        _ => Ok(input.to_string()),
    }
}

/// `youtu.be/abc`, `www.youtube.com/watch?v=abc`
fn looks_like_host_path(input: &str) -> bool {
    let host = input.split(['/', '?', '#']).next().unwrap_or_default();
    !input.contains(char::is_whitespace)
        && host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
}

/// Create `path` and its parents when missing
pub async fn ensure_directory(path: &Path) -> Result<(), AppError> {
    if path.as_os_str().is_empty() {
        return Err(AppError::Io(
            "Cannot create directory: no download location given".to_string(),
        ));
    }
    if path.is_dir() {
        return Ok(());
    }

    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| AppError::Io(format!("Cannot create directory: {}", e)))
}

pub async fn show_error(message: String) {
    show_dialog(rfd::MessageLevel::Error, "Error", message).await;
}

pub async fn show_warning(message: String) {
    show_dialog(rfd::MessageLevel::Warning, "Warning", message).await;
}

pub async fn show_info(message: String) {
    show_dialog(rfd::MessageLevel::Info, "Success", message).await;
}

async fn show_dialog(level: rfd::MessageLevel, title: &str, message: String) {
    let _ = rfd::AsyncMessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show()
        .await;
}
