use std::path::PathBuf;

use futures::StreamExt;
use iced::Task;

use crate::application::download_coordinator::{
    ensure_directory, show_error, show_info, show_warning,
};
use crate::application::{DownloadCoordinator, DownloadEvent};
use crate::config::AppConfig;
use crate::domain::{AppError, FormatChoice, VideoAnalysis};
use crate::extractor::ExtractorClient;
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
    // Set between pressing download and the directory check finishing
    pending_download: Option<PendingDownload>,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingDownload {
    url: String,
    directory: PathBuf,
    choice: FormatChoice,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new(AppConfig::from_env())
    }
}

impl DownloadApp {
    pub fn new(config: AppConfig) -> Self {
        if !config.download_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(&config.download_dir) {
                tracing::warn!(
                    dir = %config.download_dir.display(),
                    "could not create download directory: {}",
                    e
                );
            }
        }

        let coordinator =
            DownloadCoordinator::new(ExtractorClient::new(config.extractor_command.clone()));

        Self {
            view: DownloadView::new(config.download_dir),
            coordinator,
            pending_download: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    AnalysisFinished(Result<VideoAnalysis, AppError>),
    /// Folder picked in the browse dialog, `None` if cancelled
    DirectorySelected(Option<PathBuf>),
    /// Download directory exists (or could not be created)
    DirectoryPrepared(Result<(), AppError>),
    Download(DownloadEvent),
    DialogClosed,
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::AnalyzePressed => return start_analysis(app),
                DownloadMessage::BrowsePressed => {
                    let coordinator = app.coordinator.clone();
                    let initial = PathBuf::from(&app.view.download_dir);
                    return Task::perform(
                        async move { coordinator.choose_directory(initial).await },
                        Message::DirectorySelected,
                    );
                }
                DownloadMessage::DownloadPressed => return start_download(app),
                _ => {}
            }
        }
        Message::AnalysisFinished(result) => match result {
            Ok(analysis) => {
                tracing::info!(
                    title = %analysis.title,
                    resolutions = analysis.resolutions.len(),
                    top_format = analysis.resolutions.first().map(|r| r.format_id.as_str()),
                    "analysis complete"
                );
                app.view.finish_analysis(analysis);
            }
            Err(e) => {
                tracing::warn!("analysis failed: {}", e);
                app.view.analysis_failed();
                return dialog(show_error(format!("Analysis failed: {}", e)));
            }
        },
        Message::DirectorySelected(directory) => {
            if let Some(directory) = directory {
                app.view.download_dir = directory.display().to_string();
            }
        }
        Message::DirectoryPrepared(result) => {
            let Some(pending) = app.pending_download.take() else {
                return Task::none();
            };

            match result {
                Ok(()) => {
                    let stream = app.coordinator.download_stream(
                        pending.url,
                        pending.directory,
                        pending.choice,
                    );
                    return Task::stream(stream.map(Message::Download));
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    app.view.download_aborted();
                    return dialog(show_error(e.to_string()));
                }
            }
        }
        Message::Download(event) => match event {
            DownloadEvent::Progress { percent, label } => {
                app.view.set_progress(percent, &label);
            }
            DownloadEvent::Merging => {
                app.view.set_merging();
            }
            DownloadEvent::Completed => {
                tracing::info!("download complete");
                app.view.download_completed();
                return dialog(show_info("Video download completed!".to_string()));
            }
            DownloadEvent::Failed(e) => {
                app.view.download_failed();
                return dialog(show_error(format!("Download failed: {}", e)));
            }
        },
        Message::DialogClosed => {}
    }
    Task::none()
}

fn start_analysis(app: &mut DownloadApp) -> Task<Message> {
    let url = app.view.url.trim().to_string();
    if url.is_empty() {
        return dialog(show_warning(AppError::EmptyUrl.to_string()));
    }
    if app.view.is_analyzing() {
        return Task::none();
    }

    app.view.begin_analysis();
    let coordinator = app.coordinator.clone();

    // iced Task::perform runs in the background tokio executor
    Task::perform(
        async move { coordinator.analyze(url).await },
        Message::AnalysisFinished,
    )
}

fn start_download(app: &mut DownloadApp) -> Task<Message> {
    let (Some(analysis), Some(choice)) = (app.view.analysis.as_ref(), app.view.selected_choice())
    else {
        return Task::none();
    };

    let directory = PathBuf::from(app.view.download_dir.trim());
    let pending = PendingDownload {
        url: analysis.url.clone(),
        directory: directory.clone(),
        choice,
    };
    tracing::info!(url = %pending.url, ?choice, "download requested");

    app.pending_download = Some(pending);
    app.view.begin_download();

    Task::perform(
        async move { ensure_directory(&directory).await },
        Message::DirectoryPrepared,
    )
}

fn dialog(future: impl std::future::Future<Output = ()> + Send + 'static) -> Task<Message> {
    Task::perform(future, |_| Message::DialogClosed)
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DownloadPhase, Resolution};
    use tempfile::TempDir;

    fn app(dir: &TempDir) -> DownloadApp {
        DownloadApp::new(AppConfig {
            extractor_command: vec!["svd-definitely-not-installed".to_string()],
            download_dir: dir.path().join("Downloads"),
            log_filter: "info".to_string(),
        })
    }

    fn analysis() -> VideoAnalysis {
        VideoAnalysis {
            url: "https://example.com/watch?v=1".to_string(),
            title: "Clip".to_string(),
            resolutions: vec![Resolution {
                height: 720,
                format_id: "22".to_string(),
                ext: "mp4".to_string(),
                filesize: 0,
            }],
        }
    }

    #[test]
    fn test_new_creates_download_directory() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        assert!(dir.path().join("Downloads").is_dir());
        assert_eq!(app.view.status_message, "Ready");
    }

    #[test]
    fn test_empty_url_does_not_start_analysis() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::AnalyzePressed));
        assert!(!app.view.is_analyzing());
        assert_eq!(app.view.status_message, "Ready");
    }

    #[test]
    fn test_analyze_pressed_marks_analyzing() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let _ = update(
            &mut app,
            Message::UiMessage(DownloadMessage::UrlChanged(
                "https://example.com/watch?v=1".to_string(),
            )),
        );
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::AnalyzePressed));
        assert!(app.view.is_analyzing());
        assert_eq!(app.view.status_message, "Analyzing video info...");
    }

    #[test]
    fn test_analysis_result_enables_download() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let _ = update(&mut app, Message::AnalysisFinished(Ok(analysis())));
        assert!(app.view.can_download());
        assert_eq!(app.view.title, "Clip");

        let _ = update(
            &mut app,
            Message::AnalysisFinished(Err(AppError::Extractor("boom".to_string()))),
        );
        assert_eq!(app.view.status_message, "Analysis failed");
    }

    #[test]
    fn test_download_flow() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let _ = update(&mut app, Message::AnalysisFinished(Ok(analysis())));

        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        assert_eq!(
            app.pending_download,
            Some(PendingDownload {
                url: "https://example.com/watch?v=1".to_string(),
                directory: dir.path().join("Downloads"),
                choice: FormatChoice::Height(720),
            })
        );
        assert!(!app.view.can_download());
        assert_eq!(app.view.status_message, "Preparing download...");

        let _ = update(&mut app, Message::DirectoryPrepared(Ok(())));
        assert!(app.pending_download.is_none());

        let _ = update(
            &mut app,
            Message::Download(DownloadEvent::Progress {
                percent: 30.0,
                label: "30.0%".to_string(),
            }),
        );
        assert_eq!(app.view.progress, 30.0);

        let _ = update(&mut app, Message::Download(DownloadEvent::Merging));
        assert_eq!(app.view.phase, DownloadPhase::Merging);

        let _ = update(&mut app, Message::Download(DownloadEvent::Completed));
        assert_eq!(app.view.status_message, "Download Complete!");
        assert!(app.view.can_download());
    }

    #[test]
    fn test_directory_failure_aborts_download() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let _ = update(&mut app, Message::AnalysisFinished(Ok(analysis())));
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));

        let _ = update(
            &mut app,
            Message::DirectoryPrepared(Err(AppError::Io("Cannot create directory".to_string()))),
        );
        assert!(app.pending_download.is_none());
        assert!(app.view.can_download());
    }

    #[test]
    fn test_download_failure_reenables_button() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let _ = update(&mut app, Message::AnalysisFinished(Ok(analysis())));
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        let _ = update(&mut app, Message::DirectoryPrepared(Ok(())));

        let _ = update(
            &mut app,
            Message::Download(DownloadEvent::Failed(AppError::Extractor(
                "HTTP Error 403".to_string(),
            ))),
        );
        assert_eq!(app.view.status_message, "Download failed");
        assert!(app.view.can_download());
    }

    #[test]
    fn test_directory_selection_updates_path() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let _ = update(&mut app, Message::DirectorySelected(None));
        assert_eq!(
            app.view.download_dir,
            dir.path().join("Downloads").display().to_string()
        );

        let _ = update(
            &mut app,
            Message::DirectorySelected(Some(PathBuf::from("/tmp/elsewhere"))),
        );
        assert_eq!(app.view.download_dir, "/tmp/elsewhere");
    }
}
