pub mod audio_handler;

use std::{future::Future, path::Path};

use crate::types::AudioAsset;

pub trait AudioHandler {
    /// Audio container requested from the downloader
    const AUDIO_FORMAT: &'static str;

    /// Downloads the audio track of `source_url` into `workdir`
    fn download(
        &self,
        source_url: &str,
        workdir: &Path,
    ) -> impl Future<Output = anyhow::Result<AudioAsset>> + Send;
}
