mod error;
mod llm;
mod processor;
pub mod render;
pub mod server;
pub mod toolchain;
pub mod tracing;
pub mod types;
pub mod yt;

pub use error::{MissingInput, PipelineFailure, Stage};
pub use llm::{gemini, whisper};
pub use llm::{
    summarizer::{Summarizer, SummaryResponse},
    transcriber::{TranscribeResponse, Transcriber},
};
pub use processor::{
    builder::SummaryPipelineBuilder, Pipeline, PipelineState, SummaryPipeline,
};
