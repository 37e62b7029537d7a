use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};
use video_digest::{types::AudioAsset, TranscribeResponse, Transcriber};

#[derive(Clone)]
pub struct MockTranscriber {
    pub response_text: String,
    pub calls: Arc<Mutex<Vec<PathBuf>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriber {
    pub fn new(response_text: &str) -> Self {
        Self {
            response_text: response_text.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            response_text: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl Transcriber for MockTranscriber {
    type Error = anyhow::Error;

    fn model_name(&self) -> &str {
        "mock-whisper"
    }

    async fn transcribe(&self, audio: &AudioAsset) -> Result<TranscribeResponse, Self::Error> {
        self.calls.lock().unwrap().push(audio.file_path.clone());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(TranscribeResponse {
            text: self.response_text.clone(),
            language: "pt".to_string(),
        })
    }
}
