use std::{
    collections::VecDeque,
    ffi::OsString,
    io::{BufRead as _, BufReader},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::{
    foundation::{
        core::Size,
        error::{SpliceError, SpliceResult},
    },
    graph::accumulator::{CompiledGraph, OutputKind},
};

/// Environment variable that overrides the ffmpeg binary.
pub const FFMPEG_ENV: &str = "SPLICE_FFMPEG";

#[derive(Clone, Debug, PartialEq, Eq)]
/// Output encoding settings for one render.
pub struct EncodeConfig {
    pub out_path: PathBuf,
    pub overwrite: bool,
    pub video_codec: String,
    pub pixel_format: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub ffmpeg: PathBuf,
}

impl EncodeConfig {
    pub fn validate(&self) -> SpliceResult<()> {
        if self.out_path.as_os_str().is_empty() {
            return Err(SpliceError::validation("encode output path must be set"));
        }
        for (name, v) in [
            ("video codec", &self.video_codec),
            ("pixel format", &self.pixel_format),
            ("audio codec", &self.audio_codec),
            ("audio bitrate", &self.audio_bitrate),
        ] {
            if v.trim().is_empty() {
                return Err(SpliceError::validation(format!("encode {name} must be set")));
            }
        }
        Ok(())
    }

    /// Check the canvas against the pixel format.
    pub fn validate_canvas(&self, canvas: Size) -> SpliceResult<()> {
        if self.pixel_format == "yuv420p"
            && (!canvas.w.is_multiple_of(2) || !canvas.h.is_multiple_of(2))
        {
            return Err(SpliceError::validation(format!(
                "canvas {} must have even width/height for yuv420p output",
                canvas.to_filter_arg()
            )));
        }
        Ok(())
    }

    pub fn with_out_path(mut self, out_path: impl Into<PathBuf>) -> Self {
        self.out_path = out_path.into();
        self
    }
}

/// H.264/AAC MP4 defaults; the ffmpeg binary comes from `SPLICE_FFMPEG` or PATH.
pub fn default_mp4_config(out_path: impl Into<PathBuf>) -> EncodeConfig {
    EncodeConfig {
        out_path: out_path.into(),
        overwrite: true,
        video_codec: "libx264".to_string(),
        pixel_format: "yuv420p".to_string(),
        audio_codec: "aac".to_string(),
        audio_bitrate: "192k".to_string(),
        ffmpeg: std::env::var_os(FFMPEG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ffmpeg")),
    }
}

pub fn is_ffmpeg_on_path(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> SpliceResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A fully assembled ffmpeg invocation.
pub struct FfmpegCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl FfmpegCommand {
    /// Arguments for rendering `graph` with `cfg`.
    ///
    /// Codec arguments are only emitted for the streams the graph maps.
    pub fn from_graph(graph: &CompiledGraph, cfg: &EncodeConfig) -> SpliceResult<Self> {
        cfg.validate()?;
        if graph.output_mappings.is_empty() {
            return Err(SpliceError::NoContent);
        }

        let mut args: Vec<OsString> = Vec::new();
        args.push(if cfg.overwrite { "-y" } else { "-n" }.into());
        args.extend(["-hide_banner", "-nostats", "-loglevel", "warning"].map(OsString::from));
        for input in &graph.inputs {
            args.push("-i".into());
            args.push(input.into());
        }
        args.push("-filter_complex".into());
        args.push(graph.program.clone().into());
        for m in &graph.output_mappings {
            args.push("-map".into());
            args.push(m.map_arg().into());
        }
        if graph.mapping(OutputKind::Video).is_some() {
            args.extend(
                [
                    "-c:v",
                    cfg.video_codec.as_str(),
                    "-pix_fmt",
                    cfg.pixel_format.as_str(),
                    "-movflags",
                    "+faststart",
                ]
                .map(OsString::from),
            );
        }
        if graph.mapping(OutputKind::Audio).is_some() {
            args.extend(
                [
                    "-c:a",
                    cfg.audio_codec.as_str(),
                    "-b:a",
                    cfg.audio_bitrate.as_str(),
                ]
                .map(OsString::from),
            );
        }
        args.push(cfg.out_path.clone().into_os_string());

        Ok(Self {
            program: cfg.ffmpeg.clone(),
            args,
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

#[derive(Clone, Debug, Default)]
/// Shared flag that asks a running render to stop; cancelling kills ffmpeg.
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
/// Runs ffmpeg to completion, draining stderr as it goes.
pub struct FfmpegRunner {
    tail_lines: usize,
    poll: Duration,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self {
            tail_lines: 40,
            poll: Duration::from_millis(50),
        }
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `n` trailing stderr lines for error reports.
    pub fn with_tail_lines(mut self, n: usize) -> Self {
        self.tail_lines = n.max(1);
        self
    }

    /// Spawn ffmpeg and wait for it. The exit status alone decides success.
    #[tracing::instrument(skip(self, cmd, cancel), fields(program = %cmd.program.display()))]
    pub fn run(&self, cmd: &FfmpegCommand, cancel: &CancelToken) -> SpliceResult<()> {
        let mut child = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SpliceError::Other(anyhow::anyhow!(
                    "failed to spawn '{}' (is it installed and on PATH?): {e}",
                    cmd.program.display()
                ))
            })?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SpliceError::Other(anyhow::anyhow!("failed to open ffmpeg stderr")))?;

        // Drained on its own thread so a chatty ffmpeg never blocks on a full pipe.
        let cap = self.tail_lines;
        let reader = std::thread::spawn(move || {
            let mut tail = VecDeque::with_capacity(cap);
            for line in BufReader::new(stderr).lines() {
                let Ok(line) = line else { break };
                tracing::debug!(target: "splice::ffmpeg", "{line}");
                if tail.len() == cap {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail
        });

        let status = loop {
            if cancel.is_cancelled() {
                tracing::info!("render cancelled; killing ffmpeg");
                let _ = child.kill();
                let _ = child.wait();
                let _ = reader.join();
                return Err(SpliceError::engine("cancelled", "render was cancelled"));
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => std::thread::sleep(self.poll),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    return Err(SpliceError::Other(anyhow::anyhow!(
                        "failed to wait for ffmpeg: {e}"
                    )));
                }
            }
        };

        let tail = reader
            .join()
            .map_err(|_| SpliceError::Other(anyhow::anyhow!("ffmpeg stderr reader panicked")))?;
        if !status.success() {
            let tail: Vec<String> = tail.into_iter().collect();
            return Err(SpliceError::engine(status.to_string(), tail.join("\n")));
        }
        tracing::info!("ffmpeg finished");
        Ok(())
    }
}

/// Render `graph` to `cfg.out_path`.
pub fn render_graph(
    graph: &CompiledGraph,
    cfg: &EncodeConfig,
    cancel: &CancelToken,
) -> SpliceResult<()> {
    let cmd = FfmpegCommand::from_graph(graph, cfg)?;
    ensure_parent_dir(&cfg.out_path)?;
    if !cfg.overwrite && cfg.out_path.exists() {
        return Err(SpliceError::validation(format!(
            "output file '{}' already exists",
            cfg.out_path.display()
        )));
    }
    FfmpegRunner::new().run(&cmd, cancel)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/ffmpeg.rs"]
mod tests;
