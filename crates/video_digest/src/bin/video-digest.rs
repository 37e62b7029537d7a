use std::path::PathBuf;

use clap::Parser;
use digest_store::FsDocumentStore;
use tokio::net::TcpListener;
use video_digest::{
    gemini::GeminiClient,
    render::pdf::PdfRenderer,
    server::{self, AppState},
    toolchain::Toolchain,
    tracing::init_tracing_subscriber,
    whisper::{ModelSize, WhisperConfig, WhisperTranscriber},
    yt::audio_handler::YtDlp,
    SummaryPipelineBuilder,
};

#[derive(Parser)]
#[command(name = "video-digest", about = "Summarize online videos into PDF documents")]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "PORT", default_value = "5001")]
    port: u16,

    /// Directory rendered PDFs are written to and served from
    #[arg(long, env = "PDF_OUTPUT_DIRECTORY", default_value = "generated_pdfs")]
    output_dir: PathBuf,

    /// Parent of the per-request work directories (system temp by default)
    #[arg(long, env = "VIDEO_DIGEST_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Gemini API key; requests fail at the summarization stage without it
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = GeminiClient::DEFAULT_MODEL)]
    gemini_model: String,

    /// Directory holding ggml whisper models
    #[arg(long, env = "WHISPER_MODEL_DIR", default_value = "models")]
    whisper_model_dir: PathBuf,

    /// Whisper model size: tiny, base, small, medium or large
    #[arg(long, env = "WHISPER_MODEL", default_value = "base")]
    whisper_model: ModelSize,

    /// Language the audio is transcribed in
    #[arg(long, env = "TRANSCRIPTION_LANGUAGE", default_value = "pt")]
    language: String,

    /// Upper bound on summary length, in words
    #[arg(long, env = "SUMMARY_MAX_WORDS", default_value = "200")]
    summary_max_words: usize,

    /// TrueType font embedded in the PDF, Helvetica when missing
    #[arg(long, env = "PDF_FONT_PATH", default_value = PdfRenderer::DEFAULT_FONT)]
    font_path: PathBuf,

    /// Path to yt-dlp cookies file
    #[arg(long, env = "YTDLP_COOKIES_PATH")]
    cookies_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let toolchain = Toolchain::detect().await;
    let documents = FsDocumentStore::init(&cli.output_dir).await?;

    if !cli.gemini_api_key.as_deref().is_some_and(|key| !key.trim().is_empty()) {
        tracing::warn!("GEMINI_API_KEY is not set; summarization requests will fail");
    }

    let transcriber = WhisperTranscriber::new(WhisperConfig {
        model_dir: cli.whisper_model_dir,
        model_size: cli.whisper_model,
        language: cli.language,
        threads: None,
    });

    let pipeline = SummaryPipelineBuilder::new(documents.clone())
        .temp_root(cli.temp_dir)
        .audio_handler(YtDlp::new().with_cookies(cli.cookies_path))
        .transcriber(transcriber)
        .summarizer(GeminiClient::new(cli.gemini_api_key).with_model(cli.gemini_model))
        .renderer(PdfRenderer::new().with_font(Some(cli.font_path)))
        .summary_max_words(cli.summary_max_words)
        .build();

    tracing::info!(
        output_dir = ?documents.root(),
        ready = toolchain.is_ready(),
        "Starting video digest server"
    );

    let listener = TcpListener::bind((cli.host.as_str(), cli.port)).await?;
    server::serve(listener, server::router(AppState::new(pipeline, documents, toolchain))).await
}
