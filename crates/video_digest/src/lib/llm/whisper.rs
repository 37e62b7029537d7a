//! Local speech-to-text with whisper.cpp.
//!
//! Audio is first decoded by `ffmpeg` into 16 kHz mono 16-bit PCM, the only
//! input format whisper accepts, then transcribed on the blocking thread pool.
//!
//! Inference needs the `whisper` feature (on by default, requires cmake).
//! Building with `cuda`, `vulkan` or `hipblas` runs the model on the GPU.

use std::{
    fmt, io,
    path::{Path, PathBuf},
    process::Stdio,
    str::FromStr,
};

use tokio::process::Command;

use crate::{toolchain::Toolchain, types::AudioAsset, TranscribeResponse, Transcriber};

/// Sample rate whisper models are trained on
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("Audio file not found: {0}")]
    AudioNotFound(PathBuf),
    #[error("Whisper model not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("Failed to decode audio: {0}")]
    Decode(String),
    #[error("Invalid WAV data: {0}")]
    Wav(#[from] hound::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Whisper inference failed: {0}")]
    Inference(String),
    #[error("Transcription produced no text")]
    EmptyTranscript,
    #[error("Built without the `whisper` feature; transcription is unavailable")]
    FeatureDisabled,
}

/// Size of the ggml whisper model, mapped to `ggml-<size>.bin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelSize {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }

    pub fn file_name(&self) -> String {
        format!("ggml-{}.bin", self.as_str())
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            other => Err(format!(
                "unknown whisper model size `{other}` (expected tiny, base, small, medium or large)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    Gpu,
    Cpu,
}

impl ComputeDevice {
    /// GPU when an accelerated whisper backend was compiled in, CPU otherwise
    pub fn detect() -> Self {
        if cfg!(any(feature = "cuda", feature = "vulkan", feature = "hipblas")) {
            ComputeDevice::Gpu
        } else {
            ComputeDevice::Cpu
        }
    }
}

#[derive(Debug, Clone)]
pub struct WhisperConfig {
    pub model_dir: PathBuf,
    pub model_size: ModelSize,
    /// Language the transcription is forced to, e.g. "pt"
    pub language: String,
    /// Number of inference threads (None = whisper default)
    pub threads: Option<usize>,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            model_size: ModelSize::default(),
            language: "pt".to_string(),
            threads: None,
        }
    }
}

impl WhisperConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(self.model_size.file_name())
    }
}

#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    config: WhisperConfig,
    ffmpeg: PathBuf,
    model_name: String,
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Self {
        let model_name = format!("whisper-{}", config.model_size);
        Self {
            config,
            ffmpeg: PathBuf::from(Toolchain::FFMPEG),
            model_name,
        }
    }

    pub fn with_ffmpeg(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }

    /// Decodes any ffmpeg-readable audio into 16 kHz mono 16-bit WAV
    #[tracing::instrument(skip(self))]
    async fn decode_to_wav(&self, input: &Path, output: &Path) -> Result<(), TranscribeError> {
        let sample_rate = WHISPER_SAMPLE_RATE.to_string();
        let result = Command::new(&self.ffmpeg)
            .args(["-nostdin", "-y", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-ar", sample_rate.as_str(), "-ac", "1", "-c:a", "pcm_s16le"])
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to spawn ffmpeg"))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::error!(status = %result.status, %stderr, "ffmpeg failed to decode audio");
            return Err(TranscribeError::Decode(format!(
                "ffmpeg exited with {}",
                result.status
            )));
        }

        Ok(())
    }
}

impl Transcriber for WhisperTranscriber {
    type Error = TranscribeError;

    fn model_name(&self) -> &str {
        &self.model_name
    }

    #[tracing::instrument(skip(self), fields(model = %self.model_name))]
    async fn transcribe(&self, audio: &AudioAsset) -> Result<TranscribeResponse, Self::Error> {
        if !audio.file_path.exists() {
            tracing::error!(path = ?audio.file_path, "Audio file not found");
            return Err(TranscribeError::AudioNotFound(audio.file_path.clone()));
        }

        let device = ComputeDevice::detect();
        tracing::info!(?device, language = %self.config.language, "Transcribing audio");

        let wav_path = audio.file_path.with_extension("16k.wav");
        self.decode_to_wav(&audio.file_path, &wav_path).await?;

        let config = self.config.clone();
        let text = tokio::task::spawn_blocking(move || {
            let samples = read_wav_samples(&wav_path)?;
            run_inference(&config, device, &samples)
        })
        .await
        .map_err(|e| TranscribeError::Inference(format!("transcription task failed: {e}")))??;

        if text.trim().is_empty() {
            tracing::warn!("Transcription resulted in empty text");
            return Err(TranscribeError::EmptyTranscript);
        }

        tracing::info!(chars = text.len(), "Transcription finished");

        Ok(TranscribeResponse {
            text,
            language: self.config.language.clone(),
        })
    }
}

/// Reads a mono 16-bit WAV file into whisper's `f32` sample format
pub fn read_wav_samples(path: &Path) -> Result<Vec<f32>, TranscribeError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels != 1 || spec.sample_rate != WHISPER_SAMPLE_RATE || spec.bits_per_sample != 16
    {
        return Err(TranscribeError::Decode(format!(
            "expected 16 kHz mono 16-bit audio, got {} Hz, {} channel(s), {} bits",
            spec.sample_rate, spec.channels, spec.bits_per_sample
        )));
    }

    reader
        .samples::<i16>()
        .map(|sample| sample.map(|s| s as f32 / 32768.0))
        .collect::<Result<Vec<_>, _>>()
        .map_err(TranscribeError::from)
}

#[cfg(feature = "whisper")]
fn run_inference(
    config: &WhisperConfig,
    device: ComputeDevice,
    samples: &[f32],
) -> Result<String, TranscribeError> {
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    let model_path = config.model_path();
    if !model_path.exists() {
        tracing::error!(path = ?model_path, "Whisper model file not found");
        return Err(TranscribeError::ModelNotFound(model_path));
    }
    let model_path_str = model_path
        .to_str()
        .ok_or_else(|| TranscribeError::Inference("Invalid UTF-8 in model path".to_string()))?;

    let mut context_params = WhisperContextParameters::default();
    context_params.use_gpu(device == ComputeDevice::Gpu);

    let context = WhisperContext::new_with_params(model_path_str, context_params)
        .map_err(|e| TranscribeError::Inference(format!("Failed to load Whisper model: {e}")))?;
    let mut state = context
        .create_state()
        .map_err(|e| TranscribeError::Inference(format!("Failed to create Whisper state: {e}")))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some(config.language.as_str()));
    if let Some(threads) = config.threads {
        params.set_n_threads(threads as i32);
    }
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    state
        .full(params, samples)
        .map_err(|e| TranscribeError::Inference(format!("Whisper inference failed: {e}")))?;

    let mut transcription = String::new();
    for segment in state.as_iter() {
        transcription.push_str(&segment.to_string());
    }

    Ok(transcription.trim().to_string())
}

#[cfg(not(feature = "whisper"))]
fn run_inference(
    _config: &WhisperConfig,
    _device: ComputeDevice,
    _samples: &[f32],
) -> Result<String, TranscribeError> {
    Err(TranscribeError::FeatureDisabled)
}
