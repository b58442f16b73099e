use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tilekit::cli::{AnalyzeArgs, CropArgs, FlagsArgs, GridArgs, ResizeArgs, SurveyArgs};
use tilekit::{
    analyze_tileset, crop_borders, draw_grid_overlay, mapping_typescript, resize_exact, sheet,
    survey, AnalyzerConfig, Cli, Command, ImageInfo, Margins, SheetLayout, TilesetAnalysis,
    DEFAULT_GRID_COLOR, TRAVEL_FLAGS,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Grid(args) => run_grid(&args),
        Command::Crop(args) => run_crop(&args),
        Command::Resize(args) => run_resize(&args),
        Command::Analyze(args) => run_analyze(&args),
        Command::Flags(args) => run_flags(&args),
        Command::Survey(args) => run_survey(&args),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_image(path: &Path) -> Result<(DynamicImage, Option<ImageFormat>)> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("Failed to open input file: {:?}", path))?
        .with_guessed_format()
        .with_context(|| format!("Failed to read input file: {:?}", path))?;
    let format = reader.format();
    let img = reader
        .decode()
        .with_context(|| format!("Failed to decode image: {:?}", path))?;

    debug!("Loaded image: {:?} ({}x{})", path, img.width(), img.height());
    Ok((img, format))
}

fn save_overlay(img: &DynamicImage, tile_size: u32, output: &Path) -> Result<()> {
    let overlay = draw_grid_overlay(&img.to_rgba8(), tile_size, DEFAULT_GRID_COLOR)?;
    overlay
        .save(output)
        .with_context(|| format!("Failed to save overlay: {:?}", output))
}

fn run_grid(args: &GridArgs) -> Result<()> {
    let (img, _) = open_image(&args.image)?;
    let output = args.output_path();

    save_overlay(&img, args.tile_size, &output)?;
    info!("Overlay saved: {}", output.display());
    Ok(())
}

fn run_crop(args: &CropArgs) -> Result<()> {
    let (img, _) = open_image(&args.input)?;
    let margins = Margins::new(args.crop_left, args.crop_top, args.crop_right, args.crop_bottom);

    let cropped = crop_borders(&img, margins)?;
    let output = args.output_path();
    cropped
        .save(&output)
        .with_context(|| format!("Failed to save output: {:?}", output))?;

    info!(
        "Cropped image saved as: {} ({}x{} -> {}x{})",
        output.display(),
        img.width(),
        img.height(),
        cropped.width(),
        cropped.height()
    );
    Ok(())
}

fn run_resize(args: &ResizeArgs) -> Result<()> {
    let (img, _) = open_image(&args.image)?;

    let resized = resize_exact(&img, args.width, args.height)?;
    let output = args.output_path();
    resized
        .save(&output)
        .with_context(|| format!("Failed to save output: {:?}", output))?;

    info!("Resized image saved as: {}", output.display());
    Ok(())
}

fn print_analysis(analysis: &TilesetAnalysis) {
    let rec = &analysis.recommendations;

    println!("=== TILESET ANALYSIS RESULTS ===");
    println!("Image: {}", analysis.image_info.filename);
    println!("Dimensions: {}", analysis.image_info.dimensions);
    println!();
    println!("Possible tile sizes: {:?}", analysis.possible_tile_sizes);
    println!(
        "Detected grid lines: {} vertical, {} horizontal",
        analysis.detected_grid_lines.vertical_count, analysis.detected_grid_lines.horizontal_count
    );
    println!();
    println!("RECOMMENDED TILE SIZE: {}px", rec.most_likely_tile_size);
    println!("Confidence: {}", rec.confidence);
    println!("Reasoning:");
    for reason in &rec.reasoning {
        println!("  - {}", reason);
    }
    println!("Total tiles detected: {}", analysis.tile_coordinates.len());
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    info!("Analyzing tileset: {}", args.image.display());
    let (img, format) = open_image(&args.image)?;

    let config = AnalyzerConfig {
        threshold: args.threshold,
        common_sizes: args.sizes.clone(),
        ..AnalyzerConfig::default()
    };
    let info = ImageInfo::new(&args.image, &img, format);
    let analysis = analyze_tileset(&img, info, &config)?;

    print_analysis(&analysis);

    let recommended = analysis.recommendations.most_likely_tile_size;
    let mut sizes = Vec::new();
    if args.all_overlays {
        sizes.extend(analysis.possible_tile_sizes.iter().copied());
    }
    if !args.no_overlay && !sizes.contains(&recommended) {
        sizes.push(recommended);
    }

    for size in sizes {
        let output = args.overlay_path(size);
        save_overlay(&img, size, &output)?;
        info!("Grid overlay created: {}", output.display());
    }

    if let Some(json_path) = args.json_path() {
        let json =
            serde_json::to_string_pretty(&analysis).context("Failed to serialize analysis")?;
        fs::write(&json_path, json)
            .with_context(|| format!("Failed to write analysis: {:?}", json_path))?;
        info!("Analysis saved to: {}", json_path.display());
    }

    Ok(())
}

fn run_flags(args: &FlagsArgs) -> Result<()> {
    let layout = SheetLayout::new(
        args.flag_width,
        args.flag_height,
        args.columns,
        TRAVEL_FLAGS.len(),
    )?;
    let artifacts = sheet::generate(&args.assets, &args.output_dir, &TRAVEL_FLAGS, &layout)?;

    info!("Tile sheet: {}", artifacts.sheet.display());
    info!("Metadata: {}", artifacts.metadata.display());
    info!("TypeScript: {}", artifacts.typescript.display());
    info!(
        "Tile sheet dimensions: {}x{}, {} flags",
        artifacts.width,
        artifacts.height,
        TRAVEL_FLAGS.len()
    );
    Ok(())
}

fn run_survey(args: &SurveyArgs) -> Result<()> {
    let (img, _) = open_image(&args.image)?;
    let (width, height) = (img.width(), img.height());
    let fits = survey(width, height, &args.sizes)?;

    println!("=== GRID FIT: {} ({}x{}) ===", args.image.display(), width, height);
    println!(
        "{:>6}  {:>10}  {:>7}  {:>10}  {}",
        "size", "grid", "tiles", "remainder", "perfect"
    );
    for fit in &fits {
        println!(
            "{:>6}  {:>10}  {:>7}  {:>10}  {}",
            fit.tile_size,
            format!("{}x{}", fit.columns, fit.rows),
            fit.total_tiles,
            format!("{}x{}", fit.remainder_x, fit.remainder_y),
            if fit.perfect_fit() { "yes" } else { "no" }
        );
    }

    if let Some(tile_size) = args.mapping {
        let output = args.mapping_path(tile_size);
        let mapping = mapping_typescript(width, height, tile_size)?;
        fs::write(&output, mapping)
            .with_context(|| format!("Failed to write mapping: {:?}", output))?;
        info!("Tile mapping saved to: {}", output.display());
    }

    Ok(())
}
