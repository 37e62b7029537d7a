use std::{fmt::Debug, future::Future};

use crate::types::AudioAsset;

pub trait Transcriber {
    type Error: Debug + std::fmt::Display + Send + Sync + 'static;

    /// Name of the speech-to-text model in use, for logging
    fn model_name(&self) -> &str;

    fn transcribe(
        &self,
        audio: &AudioAsset,
    ) -> impl Future<Output = Result<TranscribeResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct TranscribeResponse {
    pub text: String,
    pub language: String,
}
