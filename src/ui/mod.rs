use std::path::PathBuf;

use iced::{
    widget::{button, column, pick_list, progress_bar, row, text, text_input, Space},
    Alignment, Element, Length,
};

use crate::domain::{DownloadPhase, FormatChoice, ResolutionOption, VideoAnalysis};

pub const DEFAULT_TITLE: &str = "Please enter URL and click Analyze...";

/// Main view state
pub struct DownloadView {
    pub url: String,
    pub download_dir: String,
    pub title: String,
    pub options: Vec<ResolutionOption>,
    pub selected: Option<ResolutionOption>,
    pub analysis: Option<VideoAnalysis>,
    /// Percent, 0 to 100
    pub progress: f32,
    pub status_message: String,
    pub phase: DownloadPhase,
    analyzing: bool,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self::new(PathBuf::new())
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    AnalyzePressed,
    ResolutionSelected(ResolutionOption),
    DownloadDirChanged(String),
    BrowsePressed,
    DownloadPressed,
}

impl DownloadView {
    pub fn new(download_dir: PathBuf) -> Self {
        Self {
            url: String::new(),
            download_dir: download_dir.display().to_string(),
            title: DEFAULT_TITLE.to_string(),
            options: Vec::new(),
            selected: None,
            analysis: None,
            progress: 0.0,
            status_message: "Ready".to_string(),
            phase: DownloadPhase::Idle,
            analyzing: false,
        }
    }

    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.url = url;
            }
            DownloadMessage::ResolutionSelected(option) => {
                self.selected = Some(option);
            }
            DownloadMessage::DownloadDirChanged(dir) => {
                self.download_dir = dir;
            }
            DownloadMessage::AnalyzePressed
            | DownloadMessage::BrowsePressed
            | DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn is_downloading(&self) -> bool {
        matches!(
            self.phase,
            DownloadPhase::Downloading | DownloadPhase::Merging
        )
    }

    pub fn can_download(&self) -> bool {
        self.analysis.is_some() && self.selected.is_some() && !self.is_downloading()
    }

    /// The selected format, only when a download may start
    pub fn selected_choice(&self) -> Option<FormatChoice> {
        if !self.can_download() {
            return None;
        }
        self.selected.as_ref().map(|option| option.choice)
    }

    pub fn begin_analysis(&mut self) {
        self.analyzing = true;
        if !self.is_downloading() {
            self.phase = DownloadPhase::Analyzing;
        }
        self.status_message = "Analyzing video info...".to_string();
    }

    pub fn finish_analysis(&mut self, analysis: VideoAnalysis) {
        self.analyzing = false;
        self.title = analysis.title.clone();
        self.options = analysis.options();
        self.selected = self.options.first().cloned();
        self.analysis = Some(analysis);
        if !self.is_downloading() {
            self.phase = DownloadPhase::Ready;
        }
        self.status_message = "Analysis complete. Select resolution and download.".to_string();
    }

    pub fn analysis_failed(&mut self) {
        self.analyzing = false;
        if self.phase == DownloadPhase::Analyzing {
            self.phase = if self.analysis.is_some() {
                DownloadPhase::Ready
            } else {
                DownloadPhase::Idle
            };
        }
        self.status_message = "Analysis failed".to_string();
    }

    pub fn begin_download(&mut self) {
        self.phase = DownloadPhase::Downloading;
        self.progress = 0.0;
        self.status_message = "Preparing download...".to_string();
    }

    /// The download never started, e.g. the target folder is unusable
    pub fn download_aborted(&mut self) {
        self.phase = if self.analysis.is_some() {
            DownloadPhase::Ready
        } else {
            DownloadPhase::Idle
        };
        self.status_message = "Download directory unavailable".to_string();
    }

    pub fn set_progress(&mut self, percent: f32, label: &str) {
        self.phase = DownloadPhase::Downloading;
        self.progress = percent.clamp(0.0, 100.0);
        self.status_message = format!("Downloading... {}", label);
    }

    pub fn set_merging(&mut self) {
        self.phase = DownloadPhase::Merging;
        self.status_message = "Download complete, processing merge...".to_string();
    }

    pub fn download_completed(&mut self) {
        self.phase = DownloadPhase::Completed;
        self.progress = 100.0;
        self.status_message = "Download Complete!".to_string();
    }

    pub fn download_failed(&mut self) {
        self.phase = DownloadPhase::Failed;
        self.status_message = "Download failed".to_string();
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let analyze = button("Analyze")
            .on_press_maybe((!self.is_analyzing()).then_some(DownloadMessage::AnalyzePressed))
            .padding([10, 20]);

        let resolutions = pick_list(
            self.options.as_slice(),
            self.selected.as_ref(),
            DownloadMessage::ResolutionSelected,
        )
        .placeholder("Analyze a video first")
        .width(Length::Fill);

        let download = button("Start Download")
            .on_press_maybe(
                self.can_download()
                    .then_some(DownloadMessage::DownloadPressed),
            )
            .padding([10, 20])
            .width(Length::Fill);

        column![
            text("Video URL").size(16),
            row![
                text_input("Paste a video URL...", &self.url)
                    .on_input(DownloadMessage::UrlChanged)
                    .on_submit(DownloadMessage::AnalyzePressed)
                    .padding(10)
                    .width(Length::Fill),
                analyze,
            ]
            .spacing(10),
            Space::new().height(Length::Fixed(10.0)),
            text("Video Info").size(16),
            text(&self.title).size(14),
            row![text("Select Resolution:").size(14), resolutions]
                .spacing(10)
                .align_y(Alignment::Center),
            Space::new().height(Length::Fixed(10.0)),
            text("Download Location").size(16),
            row![
                text_input("Download folder", &self.download_dir)
                    .on_input(DownloadMessage::DownloadDirChanged)
                    .padding(10)
                    .width(Length::Fill),
                button("Browse...")
                    .on_press(DownloadMessage::BrowsePressed)
                    .padding([10, 20]),
            ]
            .spacing(10),
            Space::new().height(Length::Fixed(10.0)),
            progress_bar(0.0..=100.0, self.progress),
            text(&self.status_message).size(14),
            download,
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Resolution;

    fn analysis() -> VideoAnalysis {
        VideoAnalysis {
            url: "https://example.com/watch?v=1".to_string(),
            title: "Clip".to_string(),
            resolutions: vec![
                Resolution {
                    height: 1080,
                    format_id: "137".to_string(),
                    ext: "mp4".to_string(),
                    filesize: 0,
                },
                Resolution {
                    height: 720,
                    format_id: "22".to_string(),
                    ext: "mp4".to_string(),
                    filesize: 0,
                },
            ],
        }
    }

    #[test]
    fn test_initial_state() {
        let view = DownloadView::new(PathBuf::from("/tmp/dl"));
        assert_eq!(view.title, DEFAULT_TITLE);
        assert_eq!(view.status_message, "Ready");
        assert_eq!(view.download_dir, "/tmp/dl");
        assert!(!view.can_download());
    }

    #[test]
    fn test_analysis_selects_first_option_and_enables_download() {
        let mut view = DownloadView::default();
        view.begin_analysis();
        assert!(view.is_analyzing());

        view.finish_analysis(analysis());
        assert!(!view.is_analyzing());
        assert_eq!(view.title, "Clip");
        assert_eq!(view.options.len(), 3);
        assert_eq!(view.selected_choice(), Some(FormatChoice::Height(1080)));
        assert!(view.can_download());
    }

    #[test]
    fn test_selecting_resolution_changes_choice() {
        let mut view = DownloadView::default();
        view.finish_analysis(analysis());

        let best = view.options.last().cloned().unwrap();
        view.update(DownloadMessage::ResolutionSelected(best));
        assert_eq!(view.selected_choice(), Some(FormatChoice::Best));
    }

    #[test]
    fn test_download_disables_button_until_done() {
        let mut view = DownloadView::default();
        view.finish_analysis(analysis());

        view.begin_download();
        assert!(!view.can_download());
        assert_eq!(view.selected_choice(), None);

        view.set_progress(42.5, "42.5%");
        assert_eq!(view.progress, 42.5);
        assert_eq!(view.status_message, "Downloading... 42.5%");

        view.set_merging();
        assert!(!view.can_download());

        view.download_completed();
        assert_eq!(view.progress, 100.0);
        assert!(view.can_download());
    }

    #[test]
    fn test_failures_reenable_actions() {
        let mut view = DownloadView::default();
        view.begin_analysis();
        view.analysis_failed();
        assert_eq!(view.phase, DownloadPhase::Idle);
        assert_eq!(view.status_message, "Analysis failed");

        view.finish_analysis(analysis());
        view.begin_download();
        view.download_failed();
        assert_eq!(view.status_message, "Download failed");
        assert!(view.can_download());
    }
}
