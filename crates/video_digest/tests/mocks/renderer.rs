use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    thread::ThreadId,
};
use video_digest::render::DocumentRenderer;

pub const MOCK_PDF_BYTES: &[u8] = b"%PDF-1.4 mock document";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Write,
    Fail,
    Panic,
}

#[derive(Clone)]
pub struct MockRenderer {
    pub calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
    pub threads: Arc<Mutex<Vec<ThreadId>>>,
    pub mode: RenderMode,
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::with_mode(RenderMode::Write)
    }
}

impl MockRenderer {
    pub fn with_mode(mode: RenderMode) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            threads: Arc::new(Mutex::new(Vec::new())),
            mode,
        }
    }
}

impl DocumentRenderer for MockRenderer {
    fn render(&self, text: &str, destination: &Path) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), destination.to_path_buf()));
        self.threads.lock().unwrap().push(std::thread::current().id());

        match self.mode {
            RenderMode::Write => {
                std::fs::write(destination, MOCK_PDF_BYTES)?;
                Ok(())
            }
            RenderMode::Fail => Err(anyhow::anyhow!("font table corrupted")),
            RenderMode::Panic => panic!("renderer exploded"),
        }
    }
}
