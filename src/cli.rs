// ============================================================================
// VisionBoard CLI - headless effect processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   visionboard -i photo.jpg --effect sepia --intensity 0.7 -o out.png
//   visionboard -i photo.jpg --background solid:#ff8800 -o cutout.png
//   visionboard -i "shots/*.jpg" --effect vintage --output-dir processed/
//   visionboard -i a.png b.png --effect bw --board board.png
//
// No GUI is opened in CLI mode. Files are processed one after another on the
// current thread; the pixel operations themselves still use rayon.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use egui::Vec2;

use visionboard::board::BoardStore;
use visionboard::io::{encode_png, fit_size, load_image, save_png};
use visionboard::ops::{Background, BorderKeySegmenter, EffectPipeline, ImageEffect, SegmentationSettings};
use visionboard::render::{SnapshotOptions, render_board};
use visionboard::settings::AppSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// VisionBoard headless image processor.
#[derive(Parser, Debug)]
#[command(
    name = "visionboard",
    about = "VisionBoard headless effect processor",
    long_about = "Apply VisionBoard image effects and background replacement to image\n\
                  files without opening the GUI. Output is always PNG.\n\n\
                  Effects: none, vintage, blur, bw, sepia, vignette, brightness, contrast, saturate\n\
                  Backgrounds: none, solid:#rrggbb, gradient:#from:#to, blur, grid, dots, noise, transparent\n\n\
                  Example:\n  \
                  visionboard -i photo.jpg --effect sepia --intensity 0.7 --background solid:#ff8800 -o out.png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Effect to apply.
    #[arg(short, long, default_value = "none", value_parser = parse_effect)]
    pub effect: ImageEffect,

    /// Effect intensity, 0.0 to 1.0.
    #[arg(short = 'n', long, default_value_t = 0.5, value_name = "0-1")]
    pub intensity: f32,

    /// Background replacement applied behind the detected subject.
    #[arg(short, long, default_value = "none", value_parser = parse_background)]
    pub background: Background,

    /// Subject keyer threshold, 0.0 to 1.0. Defaults to the saved setting.
    #[arg(long, value_name = "0-1")]
    pub threshold: Option<f32>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE.png")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also lay every result out on a board and save a snapshot here.
    #[arg(long, value_name = "FILE.png")]
    pub board: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_effect(s: &str) -> Result<ImageEffect, String> {
    s.parse()
}

fn parse_background(s: &str) -> Result<Background, String> {
    s.parse()
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs, settings: &AppSettings) -> ExitCode {
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

    if let Some(out) = &args.output {
        if !is_png_path(out) {
            eprintln!("error: only PNG output is supported ('{}').", out.display());
            return ExitCode::FAILURE;
        }
    }

    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let pipeline = EffectPipeline::new(args.effect, args.intensity.clamp(0.0, 1.0), args.background);
    let segmenter = BorderKeySegmenter::new(SegmentationSettings {
        threshold: args.threshold.unwrap_or(settings.segmentation_threshold),
        ..settings.segmentation()
    });

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;
    let mut results: Vec<image::RgbaImage> = Vec::new();

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

        match run_one(input_path, &output_path, &pipeline, &segmenter) {
            Ok(img) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
                if args.board.is_some() {
                    results.push(img);
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if let Some(board_path) = &args.board {
        match compose_board(&results, settings, board_path) {
            Ok(n) => println!("board: {} item(s) → {}", n, board_path.display()),
            Err(e) => {
                eprintln!("error: board snapshot failed: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    pipeline: &EffectPipeline,
    segmenter: &BorderKeySegmenter,
) -> Result<image::RgbaImage, String> {
    let original = load_image(input).map_err(|e| format!("load failed: {}", e))?;

    let mut result = None;
    pipeline.commit(&original, segmenter, |img| result = Some(img));
    let img = result.ok_or_else(|| "pipeline produced no image".to_string())?;

    save_png(&img, output).map_err(|e| format!("save failed: {}", e))?;
    Ok(img)
}

/// Lay results out left to right, one text caption on top, and snapshot.
fn compose_board(images: &[image::RgbaImage], settings: &AppSettings, path: &Path) -> Result<usize, String> {
    let mut store = BoardStore::new();
    let caption = store.add_text();
    store.set_text(caption, format!("{} image(s)", images.len()));
    store.move_item(caption, Vec2::new(20.0, 20.0));

    let gap = 20.0;
    let mut x = gap;
    for img in images {
        let bytes = encode_png(img).map_err(|e| e.to_string())?;
        let size = fit_size(img.width(), img.height(), settings.import_max_edge);
        store.add_image_at(bytes, Vec2::new(x, 140.0), size);
        x += size.x + gap;
    }

    let options = SnapshotOptions {
        grid_step: settings.show_grid.then_some(settings.grid_step),
        ..SnapshotOptions::default()
    };
    let snapshot = render_board(&store, &options).map_err(|e| e.to_string())?;
    save_png(&snapshot, path).map_err(|e| e.to_string())?;
    Ok(images.len())
}

// ============================================================================
// Helpers
// ============================================================================

fn is_png_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

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

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: next to the input as `<stem>_vb.png`
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.png", stem)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}_vb.png", stem)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let args = CliArgs::try_parse_from([
            "visionboard",
            "-i",
            "photo.jpg",
            "--effect",
            "sepia",
            "--intensity",
            "0.7",
            "--background",
            "solid:#ff8800",
            "-o",
            "out.png",
        ])
        .expect("valid args");
        assert_eq!(args.effect, ImageEffect::Sepia);
        assert_eq!(args.background, Background::Solid([255, 136, 0, 255]));
        assert_eq!(args.output, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn unknown_effect_is_rejected() {
        assert!(CliArgs::try_parse_from(["visionboard", "-i", "x.png", "--effect", "glitter"]).is_err());
    }

    #[test]
    fn output_path_priority() {
        let input = Path::new("shots/cat.jpg");
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out"))),
            Some(PathBuf::from("out/cat.png"))
        );
        assert_eq!(build_output_path(input, None, None), Some(PathBuf::from("shots/cat_vb.png")));
    }
}
