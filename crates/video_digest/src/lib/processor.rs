pub mod builder;

use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use digest_store::{DocumentName, FsDocumentStore};
use tempfile::TempDir;

use crate::{
    error::{PipelineFailure, Stage},
    render::DocumentRenderer,
    types::{AudioAsset, PipelineOutput, RenderedDocument, SummarizationRequest},
    yt::AudioHandler,
    Summarizer, Transcriber,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Received,
    Downloading,
    Transcribing,
    Summarizing,
    Rendering,
    Done,
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

pub trait Pipeline {
    /// Runs every stage for `request` in order, stopping at the first failure
    fn run(
        &self,
        request: &SummarizationRequest,
    ) -> impl Future<Output = Result<PipelineOutput, PipelineFailure>> + Send;
}

/// Download, transcribe, summarize and render a single video
#[derive(Debug)]
pub struct SummaryPipeline<A, T, S, R>
where
    A: AudioHandler + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    R: DocumentRenderer + Send + Sync + 'static,
{
    temp_root: Option<PathBuf>,
    documents: FsDocumentStore,
    audio_handler: A,
    transcriber: T,
    summarizer: S,
    renderer: Arc<R>,
    summary_max_words: usize,
}

impl<A, T, S, R> SummaryPipeline<A, T, S, R>
where
    A: AudioHandler + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    R: DocumentRenderer + Send + Sync + 'static,
{
    pub fn documents(&self) -> &FsDocumentStore {
        &self.documents
    }

    #[tracing::instrument(skip(self, workdir))]
    async fn download_audio(
        &self,
        source_url: &str,
        workdir: &Path,
    ) -> Result<AudioAsset, PipelineFailure> {
        self.audio_handler
            .download(source_url, workdir)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to download audio"))
            .map_err(|e| PipelineFailure::new(Stage::Download, format!("{e:#}")))
    }

    #[tracing::instrument(skip(self), fields(model = self.transcriber.model_name()))]
    async fn transcribe(&self, audio: &AudioAsset) -> Result<String, PipelineFailure> {
        let response = self
            .transcriber
            .transcribe(audio)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to transcribe audio"))
            .map_err(|e| PipelineFailure::new(Stage::Transcription, e.to_string()))?;

        if response.text.trim().is_empty() {
            tracing::error!("Transcriber returned an empty transcript");
            return Err(PipelineFailure::new(
                Stage::Transcription,
                "empty transcript",
            ));
        }

        tracing::debug!(language = %response.language, chars = response.text.len(), "Transcript ready");
        Ok(response.text)
    }

    #[tracing::instrument(skip_all, fields(model = self.summarizer.model_name()))]
    async fn summarize(&self, transcript: &str) -> Result<String, PipelineFailure> {
        let response = self
            .summarizer
            .summarize(transcript, self.summary_max_words)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to summarize transcript"))
            .map_err(|e| PipelineFailure::new(Stage::Summarization, e.to_string()))?;

        let summary = response.summary.trim();
        if summary.is_empty() {
            tracing::error!("Summarizer returned an empty summary");
            return Err(PipelineFailure::new(Stage::Summarization, "empty summary"));
        }

        Ok(summary.to_string())
    }

    /// Writes the summary document on the blocking pool; failures here never
    /// fail the run
    #[tracing::instrument(skip(self, summary))]
    async fn render_document(&self, source_url: &str, summary: &str) -> Option<RenderedDocument> {
        let name = DocumentName::from_source_url(source_url);
        let file_path = self.documents.document_path(&name);

        let renderer = self.renderer.clone();
        let text = summary.to_string();
        let destination = file_path.clone();

        match tokio::task::spawn_blocking(move || renderer.render(&text, &destination)).await {
            Ok(Ok(())) => Some(RenderedDocument {
                file_path,
                file_name: name.file_name(),
            }),
            Ok(Err(e)) => {
                tracing::error!(error = ?e, "Failed to render document, returning summary only");
                None
            }
            Err(e) => {
                tracing::error!(error = ?e, "Document renderer panicked, returning summary only");
                None
            }
        }
    }
}

impl<A, T, S, R> Pipeline for SummaryPipeline<A, T, S, R>
where
    A: AudioHandler + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    R: DocumentRenderer + Send + Sync + 'static,
{
    #[tracing::instrument(skip_all, fields(url = %request.source_url))]
    async fn run(&self, request: &SummarizationRequest) -> Result<PipelineOutput, PipelineFailure> {
        let mut progress = Progress::default();

        progress.advance(PipelineState::Downloading);
        let workdir = ScopedWorkdir::create(self.temp_root.as_deref())
            .map_err(|e| PipelineFailure::new(Stage::Download, format!("work directory: {e}")))
            .map_err(|f| progress.fail(f))?;
        let audio = self
            .download_audio(&request.source_url, workdir.path())
            .await
            .map_err(|f| progress.fail(f))?;

        progress.advance(PipelineState::Transcribing);
        let transcript = self.transcribe(&audio).await.map_err(|f| progress.fail(f))?;
        drop(workdir);

        progress.advance(PipelineState::Summarizing);
        let summary = self.summarize(&transcript).await.map_err(|f| progress.fail(f))?;

        progress.advance(PipelineState::Rendering);
        let document = self.render_document(&request.source_url, &summary).await;

        progress.advance(PipelineState::Done);
        Ok(PipelineOutput { summary, document })
    }
}

#[derive(Debug, Default)]
struct Progress {
    state: PipelineState,
}

impl Progress {
    fn advance(&mut self, next: PipelineState) {
        tracing::info!(from = ?self.state, to = ?next, "Pipeline state changed");
        self.state = next;
    }

    fn fail(&mut self, failure: PipelineFailure) -> PipelineFailure {
        self.advance(PipelineState::Failed(failure.stage));
        failure
    }
}

/// Per-run temporary directory, removed when dropped
#[derive(Debug)]
struct ScopedWorkdir {
    dir: Option<TempDir>,
}

impl ScopedWorkdir {
    fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("video_digest_");

        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        tracing::debug!(path = ?dir.path(), "Created work directory");
        Ok(ScopedWorkdir { dir: Some(dir) })
    }

    fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or_else(|| Path::new(""))
    }
}

impl Drop for ScopedWorkdir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(error = ?e, path = ?path, "Failed to clean up work directory");
            } else {
                tracing::info!(path = ?path, "Cleaned up work directory");
            }
        }
    }
}
