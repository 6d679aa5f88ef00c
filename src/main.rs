use anyhow::{Context, Result};
use clap::Parser;
use image::ImageReader;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use saree_fit::{
    align, apply_pleat_warp, draw_pallu_anchor, draw_pose, overlay_garment, prepare_garment,
    Cli, JsonPoseSource, Pose, PoseAlignment, PoseSource, ReferencePoseSource,
};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_frames(cli: &Cli) -> Result<Vec<Pose>> {
    let Some(path) = &cli.pose else {
        info!("No pose file given, using the reference pose");
        return Ok(vec![ReferencePoseSource.capture()?]);
    };

    // Replay recorded frames from the pose file
    let mut source = JsonPoseSource::open(path)
        .with_context(|| format!("Failed to load poses: {:?}", path))?;

    let mut frames = Vec::with_capacity(source.remaining());
    while source.remaining() > 0 {
        let pose = source
            .capture()
            .with_context(|| format!("Invalid pose in frame {} of {:?}", frames.len(), path))?;
        frames.push(pose);
    }
    info!("Loaded {} pose frame(s) from {:?}", frames.len(), path);
    Ok(frames)
}

fn render(cli: &Cli, pose: &Pose, alignment: &PoseAlignment) -> Result<()> {
    let Some((photo_path, garment_path)) = cli.render_inputs() else {
        return Ok(());
    };

    // Load photo and garment
    let photo = ImageReader::open(photo_path)
        .with_context(|| format!("Failed to open photo: {:?}", photo_path))?
        .decode()
        .with_context(|| format!("Failed to decode photo: {:?}", photo_path))?
        .to_rgba8();
    let garment = ImageReader::open(garment_path)
        .with_context(|| format!("Failed to open garment: {:?}", garment_path))?
        .decode()
        .with_context(|| format!("Failed to decode garment: {:?}", garment_path))?
        .to_rgba8();

    debug!(
        "Photo {}x{}, garment {}x{}",
        photo.width(),
        photo.height(),
        garment.width(),
        garment.height()
    );

    // Normalise the garment, follow the body's width profile, then place it
    let garment = prepare_garment(&garment, cli.garment_width);
    let garment = apply_pleat_warp(&garment, &alignment.pleat_warp);
    let mut composed = overlay_garment(&photo, &garment, &alignment.transform);

    // Debug overlay
    if cli.skeleton {
        draw_pose(&mut composed, pose, cli.min_score);
        draw_pallu_anchor(&mut composed, &alignment.pallu);
    }

    // Save result
    let output_path = cli
        .output_path()
        .context("No output path could be derived from the photo")?;
    composed
        .save(&output_path)
        .with_context(|| format!("Failed to save output: {:?}", output_path))?;

    info!(
        "Saved try-on: {:?} ({}x{})",
        output_path,
        composed.width(),
        composed.height()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let calibration = cli.calibration();

    // Acquire poses
    let frames = load_frames(&cli)?;

    for (index, pose) in frames.iter().enumerate() {
        let alignment = align(pose, &calibration);
        debug!(
            "Frame {}: arm position {:?}, {} pleat sample(s)",
            index,
            alignment.arm_position,
            alignment.pleat_warp.len()
        );

        // Report derived parameters
        if cli.css {
            println!("{}", alignment.css_transform);
        } else {
            let json = serde_json::to_string_pretty(&alignment)
                .context("Failed to serialize alignment")?;
            println!("{}", json);
        }

        // Only the first frame is rendered onto the photo
        if index == 0 {
            render(&cli, pose, &alignment)?;
        }
    }

    Ok(())
}
