use std::collections::HashSet;
use std::fmt;

use crate::extractor::{RawFormat, VideoInfo};
use crate::utils::format_megabytes;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const BEST_QUALITY_LABEL: &str = "Best Quality (Auto)";

/// A downloadable video height, one per distinct height
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub height: u32,
    pub format_id: String,
    pub ext: String,
    /// Bytes, 0 when unknown
    pub filesize: u64,
}

/// What the user asked for; turned into a format expression for the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChoice {
    Height(u32),
    Best,
}

impl FormatChoice {
    pub fn format_expression(&self) -> String {
        match self {
            FormatChoice::Height(height) => format!(
                "bestvideo[height={h}]+bestaudio/best[height={h}]",
                h = height
            ),
            FormatChoice::Best => "bestvideo+bestaudio/best".to_string(),
        }
    }
}

/// Entry of the resolution pick list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOption {
    pub choice: FormatChoice,
    label: String,
}

impl ResolutionOption {
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let mut label = format!("{}p ({})", resolution.height, resolution.ext);
        if resolution.filesize > 0 {
            label.push_str(&format!(
                " - approx. {}",
                format_megabytes(resolution.filesize)
            ));
        }

        Self {
            choice: FormatChoice::Height(resolution.height),
            label,
        }
    }

    pub fn best() -> Self {
        Self {
            choice: FormatChoice::Best,
            label: BEST_QUALITY_LABEL.to_string(),
        }
    }
}

impl fmt::Display for ResolutionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Result of a successful analysis
#[derive(Debug, Clone, PartialEq)]
pub struct VideoAnalysis {
    /// The URL that was analyzed, reused for the download
    pub url: String,
    pub title: String,
    pub resolutions: Vec<Resolution>,
}

impl VideoAnalysis {
    pub fn from_info(url: String, info: VideoInfo) -> Self {
        let title = info
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        Self {
            url,
            title,
            resolutions: collect_resolutions(info.formats),
        }
    }

    /// Resolution options, highest first, followed by the automatic choice
    pub fn options(&self) -> Vec<ResolutionOption> {
        self.resolutions
            .iter()
            .map(ResolutionOption::from_resolution)
            .chain(std::iter::once(ResolutionOption::best()))
            .collect()
    }
}

/// Keep one video format per height, tallest first
pub fn collect_resolutions(mut formats: Vec<RawFormat>) -> Vec<Resolution> {
    // Stable sort keeps the extractor's ordering among equal heights
    formats.sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));

    let mut seen_heights = HashSet::new();
    formats
        .into_iter()
        .filter_map(|format| {
            let height = format.height.filter(|h| *h > 0)?;
            if !format.is_video() || !seen_heights.insert(height) {
                return None;
            }

            Some(Resolution {
                height,
                filesize: format.size_bytes(),
                format_id: format.format_id,
                ext: format.ext,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Analyzing,
    Ready,
    Downloading,
    Merging,
    Completed,
    Failed,
}
