use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MissingInput, RENDER_FAILURE_MESSAGE};

/// Route clients use to fetch a rendered document
pub const DOWNLOAD_ROUTE_PREFIX: &str = "/api/download_pdf";

/// JSON body accepted by `POST /api/summarize`
#[derive(Debug, Default, Deserialize)]
pub struct SummarizeBody {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizationRequest {
    pub source_url: String,
}

impl TryFrom<SummarizeBody> for SummarizationRequest {
    type Error = MissingInput;

    fn try_from(body: SummarizeBody) -> Result<Self, Self::Error> {
        let source_url = body
            .url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(MissingInput)?;

        Ok(SummarizationRequest { source_url })
    }
}

/// Audio downloaded for a single request, living in its scoped work directory
#[derive(Debug, Clone)]
pub struct AudioAsset {
    pub file_path: PathBuf,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_path: PathBuf,
    pub file_name: String,
}

/// Result of a pipeline run that produced a summary.
///
/// `document` is `None` when rendering failed; the summary is still valid.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub summary: String,
    pub document: Option<RenderedDocument>,
}

impl PipelineOutput {
    pub fn rendering_failed(&self) -> bool {
        self.document.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizeResponse {
    pub summary: String,
    pub pdf_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_pdf: Option<String>,
}

impl From<PipelineOutput> for SummarizeResponse {
    fn from(output: PipelineOutput) -> Self {
        match output.document {
            Some(document) => SummarizeResponse {
                summary: output.summary,
                pdf_download_url: Some(format!(
                    "{DOWNLOAD_ROUTE_PREFIX}/{}",
                    document.file_name
                )),
                pdf_filename: Some(document.file_name),
                error_pdf: None,
            },
            None => SummarizeResponse {
                summary: output.summary,
                pdf_filename: None,
                pdf_download_url: None,
                error_pdf: Some(RENDER_FAILURE_MESSAGE.to_string()),
            },
        }
    }
}
