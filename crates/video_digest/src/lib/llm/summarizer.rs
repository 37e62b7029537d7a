use std::{fmt::Debug, future::Future};

pub trait Summarizer {
    /// Upper bound on the summary length, in words, used when none is configured
    const DEFAULT_MAX_WORDS: usize = 200;

    type Error: Debug + std::fmt::Display + Send + Sync + 'static;

    fn model_name(&self) -> &str;

    fn summarize(
        &self,
        content: &str,
        max_words: usize,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct SummaryResponse {
    pub summary: String,
}
