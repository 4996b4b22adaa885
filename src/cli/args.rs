// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::PipelineConfig;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Examples:
    posture-skeleton prepare --data data/ --output processed/ --fake-output fake/ --pose-model yolo11n-pose.onnx
    posture-skeleton prepare -d data/ -o processed/ -f fake/ -p yolo11n-pose.onnx --mode synthetic --count 50 --seed 7
    posture-skeleton predict -p yolo11n-pose.onnx -c posture.onnx -s photo.jpg"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn a labeled photo dataset into skeleton images
    Prepare(PrepareArgs),
    /// Classify the posture in a single image
    Predict(PredictArgs),
}

/// Output flavour of the prepare command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One skeleton per source image
    Real,
    /// Jittered skeleton variants per source image
    Synthetic,
}

/// Options shared by every command that normalizes and rasterizes poses.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Per-keypoint confidence threshold
    #[arg(long, default_value_t = 0.5)]
    pub conf: f32,

    /// Whole-pose presence threshold
    #[arg(long, default_value_t = 0.2)]
    pub presence: f32,

    /// Side length of the skeleton raster
    #[arg(long, default_value_t = 128)]
    pub size: u32,

    /// Input size the pose model was exported with
    #[arg(long, default_value_t = 640)]
    pub imgsz: u32,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

impl PipelineArgs {
    /// Pipeline configuration with these options applied.
    #[must_use]
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_confidence(self.conf)
            .with_presence(self.presence)
            .with_raster_size(self.size)
    }
}

/// Arguments for the prepare command.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Dataset root laid out as subject/label/image
    #[arg(short, long)]
    pub data: String,

    /// Output root for real skeleton images
    #[arg(short, long)]
    pub output: String,

    /// Output root for synthetic skeleton images
    #[arg(short, long)]
    pub fake_output: String,

    /// Path to the YOLO-pose ONNX model
    #[arg(short, long)]
    pub pose_model: String,

    /// Which images to generate
    #[arg(long, value_enum, default_value_t = Mode::Real)]
    pub mode: Mode,

    /// Synthetic variants per source image
    #[arg(long, default_value_t = 100)]
    pub count: usize,

    /// Maximum jitter, in pixels, applied to synthetic keypoints
    #[arg(long, default_value_t = 5)]
    pub jitter: i32,

    /// Worker threads (0 = one per core)
    #[arg(long, default_value_t = 0)]
    pub workers: usize,

    /// Seed for reproducible synthetic variants
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also write each pose as JSON next to its image
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Output image format (extension)
    #[arg(long, default_value = "jpg")]
    pub format: String,

    /// Persistence failures tolerated before aborting (0 = never abort)
    #[arg(long, default_value_t = 3)]
    pub max_write_failures: usize,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl PrepareArgs {
    /// Pipeline configuration for this run.
    #[must_use]
    pub fn to_config(&self) -> PipelineConfig {
        let config = self
            .pipeline
            .to_config()
            .with_jitter_radius(self.jitter)
            .with_synthetic_count(self.count)
            .with_workers(self.workers)
            .with_image_format(self.format.as_str())
            .with_save_json(self.json)
            .with_max_persistence_failures(self.max_write_failures);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

/// Arguments for the predict command.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Path to the YOLO-pose ONNX model
    #[arg(short, long)]
    pub pose_model: String,

    /// Path to the posture classifier ONNX model
    #[arg(short, long)]
    pub classifier: String,

    /// Image to classify
    #[arg(short, long)]
    pub source: String,

    /// Also save the skeleton image the classifier saw
    #[arg(long)]
    pub save_skeleton: Option<String>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}
