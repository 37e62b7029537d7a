use std::fmt;

use serde::Serialize;

pub(crate) const RENDER_FAILURE_MESSAGE: &str =
    "Summary generated, but the PDF file could not be created.";

/// One step of the summarization pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Download,
    Transcription,
    Summarization,
    Rendering,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::Transcription => "transcription",
            Stage::Summarization => "summarization",
            Stage::Rendering => "rendering",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a pipeline run.
///
/// `message` carries the diagnostic detail for logs; clients only ever see
/// [`PipelineFailure::public_message`].
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {message}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub message: String,
}

impl PipelineFailure {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        PipelineFailure {
            stage,
            message: message.into(),
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self.stage {
            Stage::Download => {
                "Failed to download the video's audio. Check the URL and the server logs."
            }
            Stage::Transcription => "Failed to transcribe the audio.",
            Stage::Summarization => {
                "Failed to generate the summary. Check the API key and the server logs."
            }
            Stage::Rendering => RENDER_FAILURE_MESSAGE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("A video URL is required")]
pub struct MissingInput;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_names_stage() {
        let failure = PipelineFailure::new(Stage::Download, "yt-dlp exited with status 1");
        assert_eq!(
            failure.to_string(),
            "download stage failed: yt-dlp exited with status 1"
        );
    }

    #[test]
    fn test_public_message_hides_detail() {
        let failure = PipelineFailure::new(Stage::Summarization, "403 API key not valid: AIza...");
        assert!(!failure.public_message().contains("AIza"));
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_value(Stage::Transcription).unwrap();
        assert_eq!(json, serde_json::json!("transcription"));
    }
}
