use std::{fmt, sync::LazyLock};

use regex::Regex;

pub const DOCUMENT_PREFIX: &str = "resumo_video_";
pub const FALLBACK_STEM: &str = "desconhecido";
pub const DOCUMENT_EXTENSION: &str = "pdf";
pub const MAX_STEM_LEN: usize = 50;

/// Matches an 11 character video id following `v=` or a path separator
static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap());

/// Filesystem-safe name of a rendered summary document.
///
/// Always of the form `resumo_video_<stem>` where `<stem>` is made of ASCII
/// alphanumerics, `_`, `-` and `.` only and holds at most [`MAX_STEM_LEN`]
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentName(String);

impl DocumentName {
    /// Derives a document name from a video URL (or any title-like string).
    ///
    /// Prefers the video id embedded in the URL, otherwise uses the last path
    /// segment without its query string. Never fails: inputs that leave
    /// nothing usable map to `resumo_video_desconhecido`.
    pub fn from_source_url(source: &str) -> Self {
        let stem = extract_stem(source).unwrap_or_else(|| {
            tracing::debug!(source, "Falling back to default document name");
            FALLBACK_STEM.to_string()
        });

        DocumentName(format!("{DOCUMENT_PREFIX}{stem}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name the client uses to fetch the document, e.g. `resumo_video_x.pdf`
    pub fn file_name(&self) -> String {
        format!("{}.{DOCUMENT_EXTENSION}", self.0)
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn extract_stem(source: &str) -> Option<String> {
    let base = match VIDEO_ID_RE.captures(source).and_then(|cap| cap.get(1)) {
        Some(video_id) => video_id.as_str(),
        None => source.rsplit('/').next()?.split('?').next()?,
    };

    let stem = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .take(MAX_STEM_LEN)
        .collect::<String>();

    if stem.chars().all(|c| c == '.') {
        return None;
    }

    Some(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSTILE_INPUTS: &[&str] = &[
        "",
        "/",
        "?",
        "..",
        "../../etc/passwd",
        "https://example.com/../../etc/passwd",
        "https://example.com/a b;rm -rf $HOME`id`|cat>out&",
        "C:\\Windows\\System32\\cmd.exe",
        "https://example.com/vídeo-açúcar?x=1",
        "https://example.com/\"quoted\"*<name>",
        "not a url at all",
    ];

    #[test]
    fn test_short_youtube_url() {
        let name = DocumentName::from_source_url("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(name.as_str(), "resumo_video_dQw4w9WgXcQ");
        assert_eq!(name.file_name(), "resumo_video_dQw4w9WgXcQ.pdf");
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        let name =
            DocumentName::from_source_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s");
        assert_eq!(name.as_str(), "resumo_video_dQw4w9WgXcQ");
    }

    #[test]
    fn test_non_youtube_url_uses_last_segment_without_query() {
        let name = DocumentName::from_source_url("https://vimeo.com/123456?autoplay=1");
        assert_eq!(name.as_str(), "resumo_video_123456");
    }

    #[test]
    fn test_illegal_characters_are_stripped() {
        let name = DocumentName::from_source_url("clip:*name?");
        assert_eq!(name.as_str(), "resumo_video_clipname");
    }

    #[test]
    fn test_long_segment_is_truncated() {
        let long = format!("https://example.com/{}", "a.".repeat(80));
        let name = DocumentName::from_source_url(&long);
        assert_eq!(name.as_str().len(), DOCUMENT_PREFIX.len() + MAX_STEM_LEN);
    }

    #[test]
    fn test_unusable_input_falls_back() {
        for input in ["", "/", "?", "..", "https://example.com/", "&&&"] {
            let name = DocumentName::from_source_url(input);
            assert_eq!(
                name.as_str(),
                "resumo_video_desconhecido",
                "input {input:?} should fall back"
            );
        }
    }

    #[test]
    fn test_output_is_bounded_and_safe() {
        for input in HOSTILE_INPUTS {
            let name = DocumentName::from_source_url(input);
            let name = name.as_str();

            assert!(name.starts_with(DOCUMENT_PREFIX), "{input:?} -> {name}");
            assert!(
                name.len() <= DOCUMENT_PREFIX.len() + MAX_STEM_LEN,
                "{input:?} -> {name} is too long"
            );
            assert!(
                name.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')),
                "{input:?} -> {name} contains unsafe characters"
            );
            assert!(!name.contains(".."), "{input:?} -> {name}");
        }
    }

    #[test]
    fn test_sanitizer_is_deterministic() {
        for input in HOSTILE_INPUTS
            .iter()
            .chain(&["https://youtu.be/dQw4w9WgXcQ"])
        {
            assert_eq!(
                DocumentName::from_source_url(input),
                DocumentName::from_source_url(input)
            );
        }
    }
}
