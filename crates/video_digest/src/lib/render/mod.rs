pub mod layout;
pub mod pdf;

use std::path::Path;

pub trait DocumentRenderer {
    /// Writes `text` as a document at `destination`, replacing any existing file
    fn render(&self, text: &str, destination: &Path) -> anyhow::Result<()>;
}
