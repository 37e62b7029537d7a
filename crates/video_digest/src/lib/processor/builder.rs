use std::{path::PathBuf, sync::Arc};

use digest_store::FsDocumentStore;

use crate::{render::DocumentRenderer, yt::AudioHandler, Summarizer, SummaryPipeline, Transcriber};

pub struct SummaryPipelineBuilder<A = (), T = (), S = (), R = ()> {
    documents: FsDocumentStore,
    temp_root: Option<PathBuf>,
    audio_handler: A,
    transcriber: T,
    summarizer: S,
    renderer: R,
    summary_max_words: Option<usize>,
}

impl SummaryPipelineBuilder {
    pub fn new(documents: FsDocumentStore) -> Self {
        Self {
            documents,
            temp_root: None,
            audio_handler: (),
            transcriber: (),
            summarizer: (),
            renderer: (),
            summary_max_words: None,
        }
    }
}

impl<A, T, S, R> SummaryPipelineBuilder<A, T, S, R> {
    pub fn audio_handler<A2: AudioHandler + Send + Sync + 'static>(
        self,
        audio_handler: A2,
    ) -> SummaryPipelineBuilder<A2, T, S, R> {
        SummaryPipelineBuilder {
            documents: self.documents,
            temp_root: self.temp_root,
            audio_handler,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            renderer: self.renderer,
            summary_max_words: self.summary_max_words,
        }
    }

    pub fn transcriber<T2: Transcriber + Send + Sync + 'static>(
        self,
        transcriber: T2,
    ) -> SummaryPipelineBuilder<A, T2, S, R> {
        SummaryPipelineBuilder {
            documents: self.documents,
            temp_root: self.temp_root,
            audio_handler: self.audio_handler,
            transcriber,
            summarizer: self.summarizer,
            renderer: self.renderer,
            summary_max_words: self.summary_max_words,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> SummaryPipelineBuilder<A, T, S2, R> {
        SummaryPipelineBuilder {
            documents: self.documents,
            temp_root: self.temp_root,
            audio_handler: self.audio_handler,
            transcriber: self.transcriber,
            summarizer,
            renderer: self.renderer,
            summary_max_words: self.summary_max_words,
        }
    }

    pub fn renderer<R2: DocumentRenderer + Send + Sync + 'static>(
        self,
        renderer: R2,
    ) -> SummaryPipelineBuilder<A, T, S, R2> {
        SummaryPipelineBuilder {
            documents: self.documents,
            temp_root: self.temp_root,
            audio_handler: self.audio_handler,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            renderer,
            summary_max_words: self.summary_max_words,
        }
    }

    /// Parent directory for per-run work directories (system temp if `None`)
    pub fn temp_root(mut self, temp_root: Option<PathBuf>) -> Self {
        self.temp_root = temp_root;
        self
    }

    pub fn summary_max_words(mut self, max_words: usize) -> Self {
        self.summary_max_words = Some(max_words);
        self
    }
}

impl<A, T, S, R> SummaryPipelineBuilder<A, T, S, R>
where
    A: AudioHandler + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    R: DocumentRenderer + Send + Sync + 'static,
{
    pub fn build(self) -> SummaryPipeline<A, T, S, R> {
        SummaryPipeline {
            temp_root: self.temp_root,
            documents: self.documents,
            audio_handler: self.audio_handler,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            renderer: Arc::new(self.renderer),
            summary_max_words: self
                .summary_max_words
                .filter(|&words| words > 0)
                .unwrap_or(S::DEFAULT_MAX_WORDS),
        }
    }
}
