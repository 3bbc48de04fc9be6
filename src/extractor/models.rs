use serde::{Deserialize, Serialize};

/// Subset of the metadata printed by `--dump-single-json`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// One entry of the `formats` array
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    /// Some extractors only report an estimate, occasionally as a float
    #[serde(default)]
    pub filesize_approx: Option<f64>,
}

impl RawFormat {
    pub fn is_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    /// Exact size when known, otherwise the extractor's estimate, otherwise 0
    pub fn size_bytes(&self) -> u64 {
        self.filesize
            .or_else(|| {
                self.filesize_approx
                    .filter(|size| size.is_finite() && *size > 0.0)
                    .map(|size| size as u64)
            })
            .unwrap_or(0)
    }
}

/// Events produced while the extractor downloads a video
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractorEvent {
    Downloading { percent: f32, percent_text: String },
    FileFinished,
    Merging,
    /// Emitted once, after the process exits. Carries stderr on failure.
    Exited(Result<(), String>),
}
