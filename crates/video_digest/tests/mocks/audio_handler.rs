use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use video_digest::{types::AudioAsset, yt::AudioHandler};

#[derive(Clone)]
pub struct MockAudioHandler {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub workdirs: Arc<Mutex<Vec<PathBuf>>>,
    pub fail_with: Option<String>,
}

impl Default for MockAudioHandler {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            workdirs: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }
}

impl MockAudioHandler {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl AudioHandler for MockAudioHandler {
    const AUDIO_FORMAT: &'static str = "m4a";

    async fn download(&self, source_url: &str, workdir: &Path) -> anyhow::Result<AudioAsset> {
        self.calls.lock().unwrap().push(source_url.to_string());
        self.workdirs.lock().unwrap().push(workdir.to_path_buf());

        // leave something behind so cleanup is observable
        let file_path = workdir.join("downloaded_audio_for_summary.m4a");
        std::fs::write(&file_path, b"fake audio")?;

        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }

        Ok(AudioAsset {
            file_path,
            format: Self::AUDIO_FORMAT.to_string(),
        })
    }
}
