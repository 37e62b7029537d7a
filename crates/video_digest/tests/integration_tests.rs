mod mocks;

use std::path::Path;

use digest_store::FsDocumentStore;
use mocks::{
    audio_handler::MockAudioHandler,
    renderer::{MockRenderer, RenderMode, MOCK_PDF_BYTES},
    summarizer::MockSummarizer,
    transcriber::MockTranscriber,
};
use video_digest::{
    types::{SummarizationRequest, SummarizeResponse},
    Pipeline, Stage, SummaryPipeline, SummaryPipelineBuilder,
};

const VIDEO_URL: &str = "https://youtu.be/dQw4w9WgXcQ";
const TRANSCRIPT: &str = "Nesta sessão os deputados debateram o orçamento da saúde.";
const SUMMARY: &str = "Os deputados debateram o orçamento da saúde.";

type MockPipeline = SummaryPipeline<MockAudioHandler, MockTranscriber, MockSummarizer, MockRenderer>;

async fn build_pipeline(
    root: &Path,
    audio_handler: MockAudioHandler,
    transcriber: MockTranscriber,
    summarizer: MockSummarizer,
    renderer: MockRenderer,
) -> MockPipeline {
    let documents = FsDocumentStore::init(root.join("pdfs")).await.unwrap();

    SummaryPipelineBuilder::new(documents)
        .temp_root(Some(root.join("work")))
        .audio_handler(audio_handler)
        .transcriber(transcriber)
        .summarizer(summarizer)
        .renderer(renderer)
        .build()
}

fn request() -> SummarizationRequest {
    SummarizationRequest {
        source_url: VIDEO_URL.to_string(),
    }
}

fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_happy_path_renders_document() {
    let root = tempfile::tempdir().unwrap();

    let audio_handler = MockAudioHandler::default();
    let transcriber = MockTranscriber::new(TRANSCRIPT);
    let summarizer = MockSummarizer::new(&format!("  {SUMMARY}\n"));
    let renderer = MockRenderer::default();

    let workdirs = audio_handler.workdirs.clone();
    let transcriber_calls = transcriber.calls.clone();
    let summarizer_calls = summarizer.calls.clone();
    let renderer_calls = renderer.calls.clone();

    let pipeline = build_pipeline(root.path(), audio_handler, transcriber, summarizer, renderer).await;
    let output = pipeline.run(&request()).await.expect("Pipeline should succeed");

    assert_eq!(output.summary, SUMMARY, "Summary should be trimmed");

    let document = output.document.expect("Document should be rendered");
    assert_eq!(document.file_name, "resumo_video_dQw4w9WgXcQ.pdf");
    assert!(document.file_path.starts_with(pipeline.documents().root()));
    assert_eq!(std::fs::read(&document.file_path).unwrap(), MOCK_PDF_BYTES);

    let workdir = workdirs.lock().unwrap()[0].clone();
    assert_eq!(
        transcriber_calls.lock().unwrap().as_slice(),
        &[workdir.join("downloaded_audio_for_summary.m4a")]
    );
    assert_eq!(
        summarizer_calls.lock().unwrap().as_slice(),
        &[(TRANSCRIPT.to_string(), 200)],
        "Summarizer should get the transcript and the default word limit"
    );
    assert_eq!(renderer_calls.lock().unwrap()[0].0, SUMMARY);

    assert!(!workdir.exists(), "Work directory should be removed");
}

#[tokio::test]
async fn test_summary_word_limit_is_configurable() {
    let root = tempfile::tempdir().unwrap();
    let summarizer = MockSummarizer::new(SUMMARY);
    let summarizer_calls = summarizer.calls.clone();

    let documents = FsDocumentStore::init(root.path().join("pdfs")).await.unwrap();
    let pipeline = SummaryPipelineBuilder::new(documents)
        .temp_root(Some(root.path().join("work")))
        .audio_handler(MockAudioHandler::default())
        .transcriber(MockTranscriber::new(TRANSCRIPT))
        .summarizer(summarizer)
        .renderer(MockRenderer::default())
        .summary_max_words(120)
        .build();

    pipeline.run(&request()).await.unwrap();

    assert_eq!(summarizer_calls.lock().unwrap()[0].1, 120);
}

// ─── Stage failures ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_download_failure_stops_pipeline() {
    let root = tempfile::tempdir().unwrap();

    let audio_handler = MockAudioHandler::failing("ERROR: Video unavailable");
    let transcriber = MockTranscriber::new(TRANSCRIPT);
    let summarizer = MockSummarizer::new(SUMMARY);
    let renderer = MockRenderer::default();

    let workdirs = audio_handler.workdirs.clone();
    let transcriber_calls = transcriber.calls.clone();
    let summarizer_calls = summarizer.calls.clone();
    let renderer_calls = renderer.calls.clone();

    let pipeline = build_pipeline(root.path(), audio_handler, transcriber, summarizer, renderer).await;
    let failure = pipeline
        .run(&request())
        .await
        .expect_err("Download failure should fail the run");

    assert_eq!(failure.stage, Stage::Download);
    assert!(failure.message.contains("Video unavailable"));

    assert!(transcriber_calls.lock().unwrap().is_empty());
    assert!(summarizer_calls.lock().unwrap().is_empty());
    assert!(renderer_calls.lock().unwrap().is_empty());

    let workdir = workdirs.lock().unwrap()[0].clone();
    assert!(!workdir.exists(), "Work directory should be removed on failure");
    assert!(dir_is_empty(&root.path().join("work")));
    assert!(dir_is_empty(pipeline.documents().root()));
}

#[tokio::test]
async fn test_transcription_failure_reports_stage() {
    let root = tempfile::tempdir().unwrap();

    let summarizer = MockSummarizer::new(SUMMARY);
    let summarizer_calls = summarizer.calls.clone();
    let renderer = MockRenderer::default();
    let renderer_calls = renderer.calls.clone();

    let pipeline = build_pipeline(
        root.path(),
        MockAudioHandler::default(),
        MockTranscriber::failing("model file missing"),
        summarizer,
        renderer,
    )
    .await;

    let failure = pipeline.run(&request()).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Transcription);
    assert!(summarizer_calls.lock().unwrap().is_empty());
    assert!(renderer_calls.lock().unwrap().is_empty());
    assert!(dir_is_empty(&root.path().join("work")));
}

#[tokio::test]
async fn test_blank_transcript_is_a_transcription_failure() {
    let root = tempfile::tempdir().unwrap();
    let summarizer = MockSummarizer::new(SUMMARY);
    let summarizer_calls = summarizer.calls.clone();

    let pipeline = build_pipeline(
        root.path(),
        MockAudioHandler::default(),
        MockTranscriber::new(" \n "),
        summarizer,
        MockRenderer::default(),
    )
    .await;

    let failure = pipeline.run(&request()).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Transcription);
    assert!(summarizer_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_summarization_failure_reports_stage() {
    let root = tempfile::tempdir().unwrap();
    let renderer = MockRenderer::default();
    let renderer_calls = renderer.calls.clone();

    let pipeline = build_pipeline(
        root.path(),
        MockAudioHandler::default(),
        MockTranscriber::new(TRANSCRIPT),
        MockSummarizer::failing("API error: 403 - API key not valid"),
        renderer,
    )
    .await;

    let failure = pipeline.run(&request()).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Summarization);
    assert!(renderer_calls.lock().unwrap().is_empty());
    assert!(dir_is_empty(pipeline.documents().root()));
}

// ─── Partial success ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_render_failure_keeps_summary() {
    let root = tempfile::tempdir().unwrap();

    let pipeline = build_pipeline(
        root.path(),
        MockAudioHandler::default(),
        MockTranscriber::new(TRANSCRIPT),
        MockSummarizer::new(SUMMARY),
        MockRenderer::with_mode(RenderMode::Fail),
    )
    .await;

    let output = pipeline
        .run(&request())
        .await
        .expect("Rendering failure should not fail the run");

    assert_eq!(output.summary, SUMMARY);
    assert!(output.rendering_failed());

    let response = SummarizeResponse::from(output);
    assert_eq!(response.summary, SUMMARY);
    assert_eq!(response.pdf_filename, None);
    assert!(response.error_pdf.is_some());
}

#[tokio::test]
async fn test_render_panic_keeps_summary() {
    let root = tempfile::tempdir().unwrap();

    let pipeline = build_pipeline(
        root.path(),
        MockAudioHandler::default(),
        MockTranscriber::new(TRANSCRIPT),
        MockSummarizer::new(SUMMARY),
        MockRenderer::with_mode(RenderMode::Panic),
    )
    .await;

    let output = pipeline.run(&request()).await.unwrap();

    assert_eq!(output.summary, SUMMARY);
    assert!(output.document.is_none());
}

#[tokio::test]
async fn test_rendering_runs_off_the_async_worker() {
    let root = tempfile::tempdir().unwrap();
    let renderer = MockRenderer::default();
    let threads = renderer.threads.clone();

    let pipeline = build_pipeline(
        root.path(),
        MockAudioHandler::default(),
        MockTranscriber::new(TRANSCRIPT),
        MockSummarizer::new(SUMMARY),
        renderer,
    )
    .await;

    let output = pipeline.run(&request()).await.unwrap();

    assert!(output.document.is_some());
    let threads = threads.lock().unwrap();
    assert_eq!(threads.len(), 1);
    assert_ne!(threads[0], std::thread::current().id());
}

#[tokio::test]
async fn test_unparseable_url_uses_fallback_name() {
    let root = tempfile::tempdir().unwrap();

    let pipeline = build_pipeline(
        root.path(),
        MockAudioHandler::default(),
        MockTranscriber::new(TRANSCRIPT),
        MockSummarizer::new(SUMMARY),
        MockRenderer::default(),
    )
    .await;

    let output = pipeline
        .run(&SummarizationRequest {
            source_url: "???".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        output.document.unwrap().file_name,
        "resumo_video_desconhecido.pdf"
    );
}
