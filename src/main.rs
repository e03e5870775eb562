use clap::Parser;
use image::ImageReader;
use std::path::PathBuf;

use handcount::detection::preprocessing;
use handcount::{FingerCountPipeline, FrameResult};

#[derive(Parser)]
#[command(name = "handcount")]
#[command(about = "Count extended fingers in a frame sequence via background subtraction")]
struct Cli {
    /// Directory of frame images, processed in sorted filename order
    #[arg(value_name = "FRAMES_DIR")]
    frames_dir: PathBuf,

    /// ROI left edge in the full frame
    #[arg(long, default_value_t = 350)]
    roi_x: u32,

    /// ROI top edge in the full frame
    #[arg(long, default_value_t = 10)]
    roi_y: u32,

    /// ROI width
    #[arg(long, default_value_t = 250)]
    roi_width: u32,

    /// ROI height
    #[arg(long, default_value_t = 440)]
    roi_height: u32,

    /// Gaussian blur sigma applied to the ROI
    #[arg(long, default_value_t = 1.4)]
    blur_sigma: f32,

    /// Flip frames horizontally before cropping
    #[arg(long)]
    mirror: bool,

    /// Absolute-difference threshold for foreground pixels (exclusive)
    #[arg(long, default_value_t = 21)]
    diff_threshold: u8,

    /// Warm-up length in ticks
    #[arg(long, default_value_t = 70.0)]
    warmup_ticks: f32,

    /// Ticks added per frame during warm-up
    #[arg(long, default_value_t = 1.5)]
    tick_increment: f32,

    /// Background learning rate
    #[arg(long, default_value_t = 0.5)]
    learning_rate: f32,

    /// Hull area excess (percent) separating a fist from one finger
    #[arg(long, default_value_t = 16.0)]
    ratio_threshold: f64,

    /// Largest valley angle (radians) counted as a gap between fingers
    #[arg(long, default_value_t = std::f64::consts::FRAC_PI_2)]
    valley_angle_max: f64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let mut frame_paths: Vec<PathBuf> = std::fs::read_dir(&args.frames_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    frame_paths.sort();
    if frame_paths.is_empty() {
        anyhow::bail!("no frames found in {}", args.frames_dir.display());
    }
    log::info!("processing {} frames", frame_paths.len());

    let mut pipeline = FingerCountPipeline::new()
        .with_warmup_ticks(args.warmup_ticks)
        .with_tick_increment(args.tick_increment)
        .with_learning_rate(args.learning_rate)
        .with_diff_threshold(args.diff_threshold)
        .with_ratio_threshold(args.ratio_threshold)
        .with_valley_angle_max(args.valley_angle_max);

    for (index, path) in frame_paths.iter().enumerate() {
        let img = ImageReader::open(path)?
            .decode()
            .map_err(|e| anyhow::anyhow!("failed to decode {}: {}", path.display(), e))?;

        let mut gray = preprocessing::to_grayscale(&img);
        if args.roi_x + args.roi_width > gray.width() || args.roi_y + args.roi_height > gray.height()
        {
            anyhow::bail!(
                "ROI {}x{}+{}+{} does not fit inside {}x{} frame {}",
                args.roi_width,
                args.roi_height,
                args.roi_x,
                args.roi_y,
                gray.width(),
                gray.height(),
                path.display()
            );
        }
        if args.mirror {
            gray = preprocessing::mirror(&gray);
        }
        let roi = preprocessing::crop_roi(&gray, args.roi_x, args.roi_y, args.roi_width, args.roi_height);
        let roi = preprocessing::apply_blur(&roi, args.blur_sigma);

        match pipeline.process_frame(&roi)? {
            FrameResult::WarmingUp => {
                if args.verbose {
                    println!("frame {:04}: warming up", index);
                }
            }
            FrameResult::Ready(None) => {
                println!("frame {:04}: no hand detected", index);
            }
            FrameResult::Ready(Some(count)) => {
                println!(
                    "frame {:04}: {} fingers (hull excess {:.1}%)",
                    index, count.fingers, count.hull_excess_ratio
                );
            }
        }
    }

    Ok(())
}
