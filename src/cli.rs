// ============================================================================
// PaintGL CLI - headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   PaintGL --input photo.png --effect grayscale --output result.png
//   PaintGL -i photo.jpg --resize 1024x768 --anchor center -o out.png
//   PaintGL -i "shots/*.jpg" --effect sharpen --effect invert --output-dir processed/
//
// No window is opened in CLI mode.  Each file runs through the same canvas
// surface and effects as the GUI, on the software backend.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use glam::UVec2;

use crate::canvas::{check_size, Anchor, CanvasSurface};
use crate::error::Result;
use crate::io;
use crate::ops::effects;
use crate::render::{PrimitiveResources, Texture};
use crate::settings::AppSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// PaintGL headless image processor.
#[derive(Parser, Debug)]
#[command(
    name = "PaintGL",
    about = "PaintGL headless batch image processor",
    long_about = "Resize canvases and apply image effects without opening the window.\n\
                  Effects: grayscale, invert, gaussianBlur, boxBlur, sharpen, edgeDetect.\n\n\
                  Example:\n  \
                  PaintGL --input photo.png --effect gaussianBlur --output result.png\n  \
                  PaintGL -i \"*.jpg\" --resize 512x512 --anchor center --output-dir out/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// New canvas size as WIDTHxHEIGHT, applied before any effect.
    #[arg(short, long, value_name = "WxH", value_parser = parse_size)]
    pub resize: Option<UVec2>,

    /// Where the existing pixels sit after --resize.
    #[arg(short, long, value_parser = parse_anchor)]
    pub anchor: Option<Anchor>,

    /// Effect to apply; repeat to chain, applied in order.
    #[arg(short, long = "effect", value_name = "NAME")]
    pub effects: Vec<String>,

    /// Output PNG path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing; files keep their stem.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

fn parse_size(value: &str) -> std::result::Result<UVec2, String> {
    let (w, h) = value
        .to_ascii_lowercase()
        .split_once('x')
        .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w: u32 = w.parse().map_err(|_| format!("bad width '{w}'"))?;
    let h: u32 = h.parse().map_err(|_| format!("bad height '{h}'"))?;
    check_size(w, h).map_err(|e| e.to_string())?;
    Ok(UVec2::new(w, h))
}

fn parse_anchor(value: &str) -> std::result::Result<Anchor, String> {
    value.parse()
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs, settings: &AppSettings) -> ExitCode {
    // Reject bad effect names before touching any file.
    for name in &args.effects {
        if let Err(e) = name.parse::<effects::Effect>() {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    }

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let job = Job {
        resize: args.resize,
        anchor: args.anchor.unwrap_or(settings.resize_anchor),
        effects: &args.effects,
        background: settings.background.colour(),
    };

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let Some(output_path) = build_output_path(input_path, args.output.as_deref(), args.output_dir.as_deref())
        else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        match job.run(input_path, &output_path) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

/// Canvas operations applied to every input file.
pub struct Job<'a> {
    pub resize: Option<UVec2>,
    pub anchor: Anchor,
    pub effects: &'a [String],
    pub background: crate::colour::Colour,
}

impl Job<'_> {
    pub fn run(&self, input: &Path, output: &Path) -> Result<()> {
        let image = io::decode_path(input)?;
        let result = self.process(image)?;
        io::save_png(&result, output)
    }

    /// Load → resize → effects, all through a canvas surface.
    pub fn process(&self, image: image::RgbaImage) -> Result<image::RgbaImage> {
        let mut resources = PrimitiveResources::new();
        let mut canvas = CanvasSurface::new(&mut resources, image.width(), image.height(), self.background)?;
        canvas.draw_fullscreen_texture_on_canvas(&Texture::from_image(image));

        if let Some(size) = self.resize {
            canvas.resize(size.x, size.y, self.anchor)?;
        }
        for name in self.effects {
            let next = effects::apply_named(name, canvas.committed_image())?;
            canvas.draw_fullscreen_texture_on_canvas(&Texture::from_image(next));
        }
        Ok(canvas.get_canvas_image())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Output path for one input:
/// 1. `--output` (explicit path, single-file input)
/// 2. `--output-dir` (batch directory, input stem + `.png`)
/// 3. next to the input, `_out` appended when it would overwrite the input
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{stem}.png")));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{stem}.png"));
    if candidate == input {
        Some(parent.join(format!("{stem}_out.png")))
    } else {
        Some(candidate)
    }
}
