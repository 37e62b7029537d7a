pub mod gemini;
pub mod summarizer;
pub mod transcriber;
pub mod whisper;
