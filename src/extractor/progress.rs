use std::sync::LazyLock;

use regex::Regex;

use super::models::ExtractorEvent;

/// Marker prepended to every progress line so it can be told apart from
/// the extractor's regular log output
pub const PROGRESS_PREFIX: &str = "svd-progress:";

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ANSI escape regex"));

/// Value for `--progress-template`
pub fn progress_template() -> String {
    format!(
        "download:{}%(progress.status)s|%(progress._percent_str)s",
        PROGRESS_PREFIX
    )
}

/// Parse one stdout line. Lines that carry nothing useful return `None`.
pub fn parse_line(line: &str) -> Option<ExtractorEvent> {
    let line = strip_ansi(line);
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        let (status, percent_text) = rest.split_once('|').unwrap_or((rest, ""));
        return match status.trim() {
            "downloading" => {
                let percent_text = percent_text.trim().to_string();
                let percent = parse_percent(&percent_text)?;
                Some(ExtractorEvent::Downloading {
                    percent,
                    percent_text,
                })
            }
            "finished" => Some(ExtractorEvent::FileFinished),
            _ => None,
        };
    }

    if line.starts_with("[Merger]") {
        return Some(ExtractorEvent::Merging);
    }

    None
}

/// "  45.2%" -> 45.2, clamped to 0..=100. Expects color codes already removed.
pub fn parse_percent(text: &str) -> Option<f32> {
    let value = text
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f32>()
        .ok()?;

    if value.is_finite() {
        Some(value.clamp(0.0, 100.0))
    } else {
        None
    }
}

fn strip_ansi(text: &str) -> std::borrow::Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_downloading_line() {
        let event = parse_line("svd-progress:downloading|  45.2%").unwrap();
        assert_eq!(
            event,
            ExtractorEvent::Downloading {
                percent: 45.2,
                percent_text: "45.2%".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_colored_percent() {
        let event = parse_line("svd-progress:downloading|\x1b[0;94m 12.0%\x1b[0m").unwrap();
        match event {
            ExtractorEvent::Downloading {
                percent,
                percent_text,
            } => {
                assert_eq!(percent, 12.0);
                assert_eq!(percent_text, "12.0%");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_finished_and_merger() {
        assert_eq!(
            parse_line("svd-progress:finished|100.0%"),
            Some(ExtractorEvent::FileFinished)
        );
        assert_eq!(
            parse_line("[Merger] Merging formats into \"video.mp4\""),
            Some(ExtractorEvent::Merging)
        );
    }

    #[test]
    fn test_garbage_is_ignored() {
        assert_eq!(parse_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("svd-progress:downloading|N/A"), None);
        assert_eq!(parse_line("svd-progress:error|"), None);
    }

    #[test]
    fn test_parse_percent_clamps() {
        assert_eq!(parse_percent("100%"), Some(100.0));
        assert_eq!(parse_percent("250%"), Some(100.0));
        assert_eq!(parse_percent("abc"), None);
        assert_eq!(parse_percent("NaN%"), None);
    }

    #[test]
    fn test_template_uses_prefix() {
        assert!(progress_template().starts_with("download:svd-progress:"));
    }
}
