//! icering CLI: command-line interface for ice-ring contamination checks.

use clap::{Args, Parser, Subcommand, ValueEnum};
use icering::{AnalyzerConfig, DiffractionImage, IceRingAnalyzer, MatchPriority};
use std::io::Write;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "icering")]
#[command(about = "Detect ice rings in X-ray diffraction frames and score contamination")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one frame and write the contamination report (JSON).
    Analyze(CliAnalyzeArgs),

    /// Dump the radial profile of a frame as CSV.
    Profile(CliProfileArgs),

    /// Print the default analyzer configuration (JSON).
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct CliFrameArgs {
    /// Path to the input image.
    #[arg(long, conflicts_with_all = ["dataset", "frame"])]
    image: Option<PathBuf>,

    /// Dataset directory holding `frame_NNNN.png` files.
    #[arg(long, requires = "frame")]
    dataset: Option<PathBuf>,

    /// Frame number within --dataset.
    #[arg(long, requires = "dataset")]
    frame: Option<u32>,
}

impl CliFrameArgs {
    fn resolve(&self) -> CliResult<PathBuf> {
        match (&self.image, &self.dataset, self.frame) {
            (Some(path), _, _) => Ok(path.clone()),
            (None, Some(dir), Some(n)) => Ok(dataset_frame_path(dir, n)),
            _ => Err("provide either --image or --dataset with --frame"
                .to_string()
                .into()),
        }
    }
}

fn dataset_frame_path(dir: &Path, frame: u32) -> PathBuf {
    dir.join(format!("frame_{frame:04}.png"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MatchPriorityArg {
    /// First reference in list order wins.
    ListOrder,
    /// Closest expected radius wins.
    Nearest,
}

impl MatchPriorityArg {
    fn to_core(self) -> MatchPriority {
        match self {
            Self::ListOrder => MatchPriority::ListOrder,
            Self::Nearest => MatchPriority::Nearest,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct CliAnalyzeArgs {
    #[command(flatten)]
    frame: CliFrameArgs,

    /// Analyzer configuration (JSON). Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Beam center x in pixels. Requires --center-y.
    #[arg(long, requires = "center_y")]
    center_x: Option<f64>,

    /// Beam center y in pixels. Requires --center-x.
    #[arg(long, requires = "center_x")]
    center_y: Option<f64>,

    /// Detector pixel size in millimetres.
    #[arg(long)]
    pixel_size: Option<f64>,

    /// Peak prominence threshold in standard deviations of the smoothed profile.
    #[arg(long)]
    sensitivity: Option<f64>,

    /// Number of radial bin edges.
    #[arg(long)]
    num_bins: Option<usize>,

    /// Matching tolerance in pixels applied to every reference line.
    #[arg(long)]
    tolerance: Option<f64>,

    /// How a peak inside several tolerance windows is assigned.
    #[arg(long, value_enum)]
    match_priority: Option<MatchPriorityArg>,

    /// Path to write the report (JSON). Prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Drop overlay coordinate arrays from the report.
    #[arg(long)]
    no_overlays: bool,
}

impl CliAnalyzeArgs {
    fn to_config(&self) -> CliResult<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::from_json_file(path)?,
            None => AnalyzerConfig::default(),
        };

        if let (Some(cx), Some(cy)) = (self.center_x, self.center_y) {
            config.geometry.center = Some([cx, cy]);
        }
        if let Some(px) = self.pixel_size {
            config.geometry.pixel_size_mm = px;
        }
        if let Some(s) = self.sensitivity {
            config.peaks.sensitivity = s;
        }
        if let Some(n) = self.num_bins {
            config.profile.num_bins = n;
        }
        if let Some(tol) = self.tolerance {
            config.matching = config.matching.with_uniform_tolerance(tol);
        }
        if let Some(p) = self.match_priority {
            config.matching.priority = p.to_core();
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Args)]
struct CliProfileArgs {
    #[command(flatten)]
    frame: CliFrameArgs,

    /// Analyzer configuration (JSON) for geometry and bin count.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the profile (CSV). Prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Profile(args) => run_profile(&args),
        Commands::DefaultConfig => run_default_config(),
    }
}

fn load_frame(path: &Path) -> CliResult<DiffractionImage> {
    tracing::info!("Loading frame: {}", path.display());
    let image = DiffractionImage::open(path)?;
    tracing::info!("Frame size: {}x{}", image.width(), image.height());
    Ok(image)
}

fn write_output(out: Option<&Path>, text: &str) -> CliResult<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)?;
            tracing::info!("Written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

// ── analyze ───────────────────────────────────────────────────────────

fn run_analyze(args: &CliAnalyzeArgs) -> CliResult<()> {
    let path = args.frame.resolve()?;
    let config = args.to_config()?;
    let image = load_frame(&path)?;

    let analyzer = IceRingAnalyzer::with_config(config);
    let mut result = analyzer.analyze(&image)?;

    for ring in &result.detected_rings {
        tracing::info!(
            "  {:.1} Å at r={:.1}px, contamination {:.2}",
            ring.resolution,
            ring.radius_pixels,
            ring.contamination_level,
        );
    }
    tracing::info!("{}: {}", result.status, result.recommendation);

    if args.no_overlays {
        for overlay in &mut result.ring_overlays {
            overlay.coordinates.clear();
        }
    }

    let json = serde_json::to_string_pretty(&result)?;
    write_output(args.out.as_deref(), &json)
}

// ── profile ───────────────────────────────────────────────────────────

fn run_profile(args: &CliProfileArgs) -> CliResult<()> {
    let path = args.frame.resolve()?;
    let config = match &args.config {
        Some(p) => AnalyzerConfig::from_json_file(p)?,
        None => AnalyzerConfig::default(),
    };
    let image = load_frame(&path)?;

    let profile = IceRingAnalyzer::with_config(config).radial_profile(&image)?;
    tracing::info!("Radial profile: {} bins", profile.len());

    let mut csv = String::from("radius_px,intensity\n");
    for (r, v) in profile.iter() {
        csv.push_str(&format!("{r:.4},{v:.6}\n"));
    }
    write_output(args.out.as_deref(), csv.trim_end())
}

// ── default-config ────────────────────────────────────────────────────

fn run_default_config() -> CliResult<()> {
    let json = serde_json::to_string_pretty(&AnalyzerConfig::default())?;
    println!("{json}");
    Ok(())
}
