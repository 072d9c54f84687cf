//! markview CLI — command-line marker image generation.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use markview::{FontGlyphRenderer, GenerationSpec, MarkerPipeline};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "markview")]
#[command(
    about = "Synthesize a square calibration marker under an oblique view with motion blur"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a marker image.
    Generate(CliGenerateArgs),

    /// Print the effective generation spec without rendering.
    SpecInfo(CliSpecArgs),
}

#[derive(Debug, Clone, Args)]
struct CliSpecArgs {
    /// Path to a spec JSON file (markview.spec.v1). Flags override its values.
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Scale unit x in pixels; every layout extent is a multiple of it.
    #[arg(long)]
    scale: Option<u32>,

    /// Canvas width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Character rendered on the fiducial.
    #[arg(long)]
    glyph: Option<char>,

    /// Rotation about the image x axis, degrees.
    #[arg(long)]
    rot_x: Option<f64>,

    /// Rotation about the image y axis, degrees.
    #[arg(long)]
    rot_y: Option<f64>,

    /// Rotation about the image z axis, degrees.
    #[arg(long)]
    rot_z: Option<f64>,

    /// Viewpoint distance in units of the image height.
    #[arg(long)]
    focal: Option<f64>,

    /// Motion blur magnitude in pixels (0 disables blur).
    #[arg(long)]
    blur_mag: Option<u32>,

    /// Motion blur direction, counter-clockwise degrees.
    #[arg(long)]
    blur_angle: Option<f64>,
}

impl CliSpecArgs {
    /// Resolve the effective spec: file (or defaults), then flag overrides.
    fn to_spec(&self) -> CliResult<GenerationSpec> {
        let mut spec = match &self.spec {
            Some(path) => GenerationSpec::from_json_file(path)?,
            None => GenerationSpec::default(),
        };

        if let Some(v) = self.scale {
            spec.marker.scale_px = v;
        }
        if let Some(v) = self.width {
            spec.marker.width = v;
        }
        if let Some(v) = self.height {
            spec.marker.height = v;
        }
        if let Some(v) = self.glyph {
            spec.marker.glyph = v;
        }
        if let Some(v) = self.rot_x {
            spec.view.rot_x_deg = v;
        }
        if let Some(v) = self.rot_y {
            spec.view.rot_y_deg = v;
        }
        if let Some(v) = self.rot_z {
            spec.view.rot_z_deg = v;
        }
        if let Some(v) = self.focal {
            spec.view.focal = v;
        }
        if let Some(v) = self.blur_mag {
            spec.blur.magnitude = v;
        }
        if let Some(v) = self.blur_angle {
            spec.blur.angle_deg = v;
        }

        spec.validate()?;
        Ok(spec)
    }
}

#[derive(Debug, Clone, Args)]
struct CliGenerateArgs {
    #[command(flatten)]
    spec: CliSpecArgs,

    /// Path to a TTF/OTF font for the glyph. Searched for if omitted.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Directory for the timestamped output file.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Exact output path; overrides --out-dir and the timestamped name.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::SpecInfo(args) => run_spec_info(&args),
    }
}

// ── spec-info ──────────────────────────────────────────────────────────

fn run_spec_info(args: &CliSpecArgs) -> CliResult<()> {
    let spec = args.to_spec()?;

    println!("markview generation spec");
    println!("  schema:         {}", spec.schema);
    println!("  scale unit:     {} px", spec.marker.scale_px);
    println!(
        "  canvas:         {}x{} px",
        spec.marker.width, spec.marker.height
    );
    println!("  glyph:          '{}'", spec.marker.glyph);
    println!("  border extent:  {} px", spec.marker.border_extent_px());
    println!("  ring width:     {} px", 2 * spec.marker.border_delta_px());
    println!("  fiducial side:  {} px", spec.marker.fiducial_side_px());
    println!(
        "  rotation:       ({}, {}, {}) deg",
        spec.view.rot_x_deg, spec.view.rot_y_deg, spec.view.rot_z_deg
    );
    println!("  focal:          {}", spec.view.focal);
    if spec.blur.magnitude == 0 {
        println!("  blur:           off");
    } else {
        println!(
            "  blur:           magnitude {} px, angle {} deg",
            spec.blur.magnitude, spec.blur.angle_deg
        );
    }

    Ok(())
}

// ── generate ───────────────────────────────────────────────────────────

/// Bold faces first: a heavier glyph survives warping and blur better.
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

fn resolve_font(explicit: Option<&Path>) -> CliResult<FontGlyphRenderer> {
    if let Some(path) = explicit {
        return Ok(FontGlyphRenderer::from_font_file(path)?);
    }
    for candidate in FONT_SEARCH_PATHS {
        let path = Path::new(candidate);
        if path.is_file() {
            tracing::debug!("Using font {}", path.display());
            return Ok(FontGlyphRenderer::from_font_file(path)?);
        }
    }
    Err("no usable font found; pass one with --font".into())
}

fn run_generate(args: &CliGenerateArgs) -> CliResult<()> {
    let spec = args.spec.to_spec()?;
    let renderer = resolve_font(args.font.as_deref())?;

    let pipeline = MarkerPipeline::new(spec);
    let img = pipeline.generate(&renderer)?;

    let out_path = match &args.out {
        Some(path) => path.clone(),
        None => {
            let stamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S");
            args.out_dir.join(format!("marker_{}.png", stamp))
        }
    };
    img.save(&out_path).map_err(|e| -> CliError {
        format!("Failed to save {}: {}", out_path.display(), e).into()
    })?;
    tracing::info!("Marker written to {}", out_path.display());

    Ok(())
}
