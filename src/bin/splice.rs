use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "splice", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a timeline document and print the filter graph.
    Compile(CompileArgs),
    /// Print the resolved timeline as JSON.
    Timeline(CommonArgs),
    /// Compile and render to a video file (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Input timeline document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Compile options JSON; defaults are used when omitted.
    #[arg(long)]
    options: Option<PathBuf>,

    /// How sources are probed.
    #[arg(long, value_enum, default_value_t = ProbeChoice::Ffprobe)]
    probe: ProbeChoice,
}

#[derive(Parser, Debug)]
struct CompileArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Print the full compiled graph as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Fail instead of overwriting an existing output.
    #[arg(long)]
    no_overwrite: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProbeChoice {
    /// Inspect files with the system `ffprobe` (or `SPLICE_FFPROBE`).
    Ffprobe,
    /// Do not probe; only explicit durations resolve.
    None,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("SPLICE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn compile(args: &CommonArgs) -> anyhow::Result<splice::Compiled> {
    let doc = splice::Document::from_path(&args.in_path)?;
    let opts = match &args.options {
        Some(p) => splice::CompileOptions::from_path(p)?,
        None => splice::CompileOptions::default(),
    };

    let asset_root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let prober: Box<dyn splice::Prober> = match args.probe {
        ProbeChoice::Ffprobe => Box::new(splice::FfprobeProber::from_env(asset_root)),
        ProbeChoice::None => Box::new(splice::StaticProber::new()),
    };
    let registry = splice::LoweringRegistry::standard();

    let compiled = splice::compile_document(
        &doc,
        prober.as_ref(),
        &registry,
        &opts,
        Some(asset_root),
    )
    .with_context(|| format!("compile '{}'", args.in_path.display()))?;

    tracing::info!(
        clips = compiled.timeline.clips().len(),
        inputs = compiled.graph.inputs.len(),
        diagnostics = compiled.graph.diagnostics.len(),
        "compiled"
    );
    Ok(compiled)
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let compiled = compile(&args.common)?;
    let graph = &compiled.graph;
    if args.json {
        println!("{}", serde_json::to_string_pretty(graph)?);
        return Ok(());
    }

    for (i, input) in graph.inputs.iter().enumerate() {
        println!("# input {i}: {input}");
    }
    for m in &graph.output_mappings {
        println!("# map {}", m.map_arg());
    }
    println!("{}", graph.program);
    Ok(())
}

fn cmd_timeline(args: CommonArgs) -> anyhow::Result<()> {
    let compiled = compile(&args)?;
    println!("{}", serde_json::to_string_pretty(&compiled.timeline)?);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let compiled = compile(&args.common)?;

    let mut cfg = splice::default_mp4_config(&args.out);
    cfg.overwrite = !args.no_overwrite;
    cfg.validate_canvas(compiled.timeline.canvas.size())?;

    splice::render_graph(&compiled.graph, &cfg, &splice::CancelToken::new())
        .with_context(|| format!("render '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
