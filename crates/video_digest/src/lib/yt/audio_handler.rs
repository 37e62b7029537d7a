use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

use crate::{toolchain::tool_responds, types::AudioAsset, yt::AudioHandler};

/// Audio downloader backed by the `yt-dlp` command line tool
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    cookies_path: Option<PathBuf>,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlp {
    /// Base file name of the downloaded audio; yt-dlp appends the extension
    pub const BASE_NAME: &'static str = "downloaded_audio_for_summary";

    pub fn new() -> Self {
        YtDlp {
            binary: PathBuf::from("yt-dlp"),
            cookies_path: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_cookies(mut self, cookies_path: Option<PathBuf>) -> Self {
        self.cookies_path = cookies_path;
        self
    }

    fn download_args(&self, source_url: &str, output_template: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--extract-audio".into(),
            "--audio-format".into(),
            Self::AUDIO_FORMAT.into(),
            "--output".into(),
            output_template.into(),
            "--no-playlist".into(),
            "--quiet".into(),
            "--no-warnings".into(),
        ];

        if let Some(cookies_path) = &self.cookies_path {
            args.push("--cookies".into());
            args.push(cookies_path.into());
        }

        args.push(source_url.into());
        args
    }
}

impl AudioHandler for YtDlp {
    const AUDIO_FORMAT: &'static str = "m4a";

    #[tracing::instrument(skip(self))]
    async fn download(&self, source_url: &str, workdir: &Path) -> anyhow::Result<AudioAsset> {
        if !tool_responds(&self.binary, "--version").await {
            anyhow::bail!("yt-dlp not found or not working: {}", self.binary.display());
        }

        let output_template = workdir.join(format!("{}.%(ext)s", Self::BASE_NAME));
        let expected_path = workdir.join(format!("{}.{}", Self::BASE_NAME, Self::AUDIO_FORMAT));

        let output = Command::new(&self.binary)
            .args(self.download_args(source_url, &output_template))
            .stdin(Stdio::null())
            .output()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to spawn yt-dlp"))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            tracing::error!(status = %output.status, %stdout, %stderr, "yt-dlp failed to download audio");
            anyhow::bail!(
                "yt-dlp exited with {}; stderr: {}; stdout: {}",
                output.status,
                stderr.trim(),
                stdout.trim()
            );
        }

        let file_path = if expected_path.exists() {
            expected_path
        } else {
            tracing::warn!(path = ?expected_path, "yt-dlp succeeded but expected file is missing");
            find_fallback_audio(workdir, Self::BASE_NAME, Self::AUDIO_FORMAT).ok_or_else(|| {
                tracing::error!(%stdout, %stderr, dir = ?workdir, "No matching audio file produced");
                anyhow::anyhow!("yt-dlp did not produce an audio file in {}", workdir.display())
            })?
        };

        tracing::info!(path = ?file_path, "Audio downloaded");

        Ok(AudioAsset {
            file_path,
            format: Self::AUDIO_FORMAT.to_string(),
        })
    }
}

/// Looks in `dir` for a file named `<base_name>*.<extension>`.
///
/// yt-dlp occasionally varies the produced file name; this is a best-effort
/// recovery and picks the lexicographically first match.
pub fn find_fallback_audio(dir: &Path, base_name: &str, extension: &str) -> Option<PathBuf> {
    let suffix = format!(".{extension}");

    let mut candidates = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(base_name) && name.ends_with(&suffix))
        })
        .collect::<Vec<_>>();

    candidates.sort();
    candidates.into_iter().next()
}
