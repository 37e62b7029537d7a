use std::{ffi::OsStr, process::Stdio};

use serde::Serialize;
use tokio::process::Command;

/// Availability of the external command line tools the pipeline shells out
/// to, checked once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    pub yt_dlp: bool,
    pub ffmpeg: bool,
}

impl Toolchain {
    pub const YT_DLP: &'static str = "yt-dlp";
    pub const FFMPEG: &'static str = "ffmpeg";

    /// Runs each tool's version command and records which ones answered
    pub async fn detect() -> Self {
        let toolchain = Toolchain {
            yt_dlp: tool_responds(Self::YT_DLP, "--version").await,
            ffmpeg: tool_responds(Self::FFMPEG, "-version").await,
        };

        for tool in toolchain.missing() {
            tracing::warn!(tool, "Required tool not found or not working; requests will be refused");
        }

        toolchain
    }

    /// A toolchain where every tool is assumed present
    pub fn ready() -> Self {
        Toolchain {
            yt_dlp: true,
            ffmpeg: true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn missing(&self) -> Vec<&'static str> {
        [(Self::YT_DLP, self.yt_dlp), (Self::FFMPEG, self.ffmpeg)]
            .into_iter()
            .filter_map(|(tool, available)| (!available).then_some(tool))
            .collect()
    }
}

/// Returns `true` when `program version_flag` can be spawned and exits with
/// status 0
pub async fn tool_responds(program: impl AsRef<OsStr>, version_flag: &str) -> bool {
    let program = program.as_ref();

    match Command::new(program)
        .arg(version_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) if status.success() => true,
        Ok(status) => {
            tracing::debug!(?program, %status, "Tool version check failed");
            false
        }
        Err(e) => {
            tracing::debug!(?program, error = %e, "Tool could not be spawned");
            false
        }
    }
}
