use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    process::Command,
};

use rayon::prelude::*;

use crate::{
    document::model::{Document, MediaKind, Source},
    foundation::error::{SpliceError, SpliceResult},
};

/// Environment variable that overrides the ffprobe binary.
pub const FFPROBE_ENV: &str = "SPLICE_FFPROBE";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Intrinsic properties of a media source.
pub struct MediaInfo {
    /// Duration in seconds; `None` when unbounded (images, colours, live inputs).
    pub duration: Option<f64>,
    /// Whether the source carries an audio stream.
    pub has_audio: bool,
    /// Whether the source carries a picture.
    pub has_video: bool,
    /// Intrinsic picture width, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Intrinsic picture height, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl MediaInfo {
    /// Picture-only info with unbounded duration.
    pub fn still(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            duration: None,
            has_audio: false,
            has_video: true,
            width,
            height,
        }
    }

    /// Video file info.
    pub fn video(duration: f64, has_audio: bool, width: u32, height: u32) -> Self {
        Self {
            duration: Some(duration),
            has_audio,
            has_video: true,
            width: Some(width),
            height: Some(height),
        }
    }

    /// Audio-only file info.
    pub fn audio(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            has_audio: true,
            has_video: false,
            width: None,
            height: None,
        }
    }

    /// Duration if it is finite and positive.
    pub fn finite_duration(&self) -> Option<f64> {
        self.duration.filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// Capability to inspect a source before the timeline is resolved.
pub trait Prober: Send + Sync {
    /// Probe one file-backed source.
    fn probe(&self, source: &Source) -> SpliceResult<MediaInfo>;
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
/// Key under which probe results are stored: a kind plus its raw `src`.
pub struct ProbeKey {
    /// Media kind the source was declared with.
    pub kind: MediaKind,
    /// Raw `src` string from the document.
    pub src: String,
}

impl ProbeKey {
    /// Key for a source.
    pub fn of(source: &Source) -> Self {
        Self {
            kind: source.kind,
            src: source.src.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
/// Results of probing every distinct file-backed source of a document.
///
/// Failures are kept as messages so the compiler can decide per block whether
/// the failure is fatal (duration-determining source) or not.
pub struct ProbeTable {
    results: BTreeMap<ProbeKey, Result<MediaInfo, String>>,
}

impl ProbeTable {
    /// Empty table; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result.
    pub fn insert(&mut self, key: ProbeKey, result: Result<MediaInfo, String>) {
        self.results.insert(key, result);
    }

    /// Look up the probe result for a source.
    ///
    /// Colour sources are never probed and always report an unbounded still.
    pub fn lookup(&self, source: &Source) -> Result<MediaInfo, String> {
        if source.kind == MediaKind::Colour {
            return Ok(MediaInfo::still(None, None));
        }
        match self.results.get(&ProbeKey::of(source)) {
            Some(Ok(info)) => Ok(normalize_for_kind(source.kind, info.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Err(format!("'{}' was not probed", source.src)),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// `true` when nothing was probed.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn normalize_for_kind(kind: MediaKind, mut info: MediaInfo) -> MediaInfo {
    match kind {
        MediaKind::Image | MediaKind::Colour => {
            info.duration = None;
            info.has_audio = false;
            info.has_video = true;
        }
        MediaKind::Audio => {
            info.has_video = false;
        }
        MediaKind::Video => {}
    }
    info
}

/// Every file-backed source in the document, in document order, deduplicated by key.
pub fn file_sources(doc: &Document) -> Vec<&Source> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::new();
    let blocks = doc
        .blocks
        .iter()
        .flat_map(|b| b.visuals.iter().chain(b.audio.iter()));
    for s in doc
        .background
        .iter()
        .chain(blocks)
        .chain(doc.overlay.iter())
    {
        if s.kind.is_file_backed() && seen.insert(ProbeKey::of(s)) {
            out.push(s);
        }
    }
    out
}

/// Probe every distinct file-backed source of `doc` concurrently.
///
/// Returns only once all probes have finished; the compiler never probes itself.
#[tracing::instrument(skip(doc, prober))]
pub fn probe_sources(doc: &Document, prober: &dyn Prober) -> ProbeTable {
    let sources = file_sources(doc);
    let results: Vec<(ProbeKey, Result<MediaInfo, String>)> = sources
        .par_iter()
        .map(|s| {
            let r = prober.probe(s).map_err(|e| e.to_string());
            if let Err(e) = &r {
                tracing::debug!(src = %s.src, "probe failed: {e}");
            }
            (ProbeKey::of(s), r)
        })
        .collect();

    let mut table = ProbeTable::new();
    for (k, r) in results {
        table.insert(k, r);
    }
    tracing::debug!(probed = table.len(), "probing finished");
    table
}

#[derive(Clone, Debug, Default)]
/// In-memory prober keyed by `src`; used for tests and dry runs.
pub struct StaticProber {
    entries: HashMap<String, MediaInfo>,
}

impl StaticProber {
    /// Empty prober; every probe fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, src: impl Into<String>, info: MediaInfo) -> Self {
        self.entries.insert(src.into(), info);
        self
    }
}

impl Prober for StaticProber {
    fn probe(&self, source: &Source) -> SpliceResult<MediaInfo> {
        self.entries.get(&source.src).cloned().ok_or_else(|| {
            SpliceError::Other(anyhow::anyhow!("no probe data for '{}'", source.src))
        })
    }
}

#[derive(Clone, Debug)]
/// Prober backed by the system `ffprobe` binary.
pub struct FfprobeProber {
    binary: PathBuf,
    asset_root: PathBuf,
}

impl FfprobeProber {
    /// Probe with `ffprobe` from PATH, resolving relative `src` against `asset_root`.
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
            asset_root: asset_root.into(),
        }
    }

    /// Like [`FfprobeProber::new`], but honours the `SPLICE_FFPROBE` override.
    pub fn from_env(asset_root: impl Into<PathBuf>) -> Self {
        let prober = Self::new(asset_root);
        match std::env::var_os(FFPROBE_ENV) {
            Some(binary) => prober.with_binary(binary),
            None => prober,
        }
    }

    /// Use a specific ffprobe binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    fn resolve(&self, src: &str) -> PathBuf {
        let p = Path::new(src);
        if p.is_absolute() || src.contains("://") {
            p.to_path_buf()
        } else {
            self.asset_root.join(p)
        }
    }
}

impl Prober for FfprobeProber {
    fn probe(&self, source: &Source) -> SpliceResult<MediaInfo> {
        #[derive(serde::Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeOut {
            #[serde(default)]
            streams: Vec<ProbeStream>,
            format: Option<ProbeFormat>,
        }

        let path = self.resolve(&source.src);
        let out = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(&path)
            .output()
            .map_err(|e| SpliceError::Other(anyhow::anyhow!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(SpliceError::Other(anyhow::anyhow!(
                "ffprobe failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
            .map_err(|e| SpliceError::serde(format!("ffprobe json parse failed: {e}")))?;
        let video = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));
        let has_audio = parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"));
        let duration = parsed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0);

        let info = MediaInfo {
            duration,
            has_audio,
            has_video: video.is_some(),
            width: video.and_then(|v| v.width),
            height: video.and_then(|v| v.height),
        };
        Ok(normalize_for_kind(source.kind, info))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/probe.rs"]
mod tests;
