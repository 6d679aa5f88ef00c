use clap::Parser;
use std::path::PathBuf;

use crate::geometry::Calibration;

#[derive(Parser, Debug)]
#[command(name = "saree-fit")]
#[command(version, about = "Align a saree overlay to a detected body pose")]
pub struct Cli {
    /// Pose JSON file (one pose or an array of frames) [default: built-in reference pose]
    #[arg(short, long)]
    pub pose: Option<PathBuf>,

    /// Person photo to render the try-on onto
    #[arg(long, requires = "garment")]
    pub photo: Option<PathBuf>,

    /// Garment cut-out (PNG with transparency)
    #[arg(long, requires = "photo")]
    pub garment: Option<PathBuf>,

    /// Output path [default: <photo>_tryon.png]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Garment width in pixels at scale 1
    #[arg(long, default_value = "256", value_parser = clap::value_parser!(u32).range(1..))]
    pub garment_width: u32,

    /// Shoulder width in pose pixels that maps to scale 1
    #[arg(long, default_value = "70", value_parser = parse_positive)]
    pub shoulder_width: f64,

    /// Nose-to-knee height in pose pixels that maps to vertical scale 1
    #[arg(long, default_value = "400", value_parser = parse_positive)]
    pub body_height: f64,

    /// Draw the detected skeleton and pallu anchor on the render
    #[arg(long)]
    pub skeleton: bool,

    /// Minimum keypoint confidence for skeleton drawing
    #[arg(long, default_value = "0.3")]
    pub min_score: f64,

    /// Print only the CSS transform for each frame
    #[arg(long)]
    pub css: bool,

    /// Show processing details
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn calibration(&self) -> Calibration {
        Calibration {
            reference_shoulder_width: self.shoulder_width,
            reference_body_height: self.body_height,
            ..Calibration::default()
        }
    }

    /// Photo and garment paths, when a render was requested
    pub fn render_inputs(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.photo.as_ref().zip(self.garment.as_ref())
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        let photo = self.photo.as_ref()?;
        let stem = photo.file_stem().unwrap_or_default().to_string_lossy();
        let parent = photo.parent().unwrap_or(std::path::Path::new("."));
        Some(parent.join(format!("{}_tryon.png", stem)))
    }
}

fn parse_positive(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("Invalid number: {}", s))?;

    if !value.is_finite() || value <= 0.0 {
        return Err("Value must be a positive number".to_string());
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_calibration() {
        let cli = Cli::parse_from(["saree-fit"]);
        assert_eq!(cli.calibration(), Calibration::default());
        assert!(cli.render_inputs().is_none());
        assert!(cli.output_path().is_none());
    }

    #[test]
    fn test_output_next_to_photo() {
        let cli = Cli::parse_from([
            "saree-fit",
            "--photo",
            "shots/anita.jpg",
            "--garment",
            "s.png",
        ]);
        assert_eq!(cli.output_path(), Some(PathBuf::from("shots/anita_tryon.png")));
    }

    #[test]
    fn test_photo_requires_garment() {
        assert!(Cli::try_parse_from(["saree-fit", "--photo", "p.jpg"]).is_err());
    }

    #[test]
    fn test_rejects_non_positive_reference() {
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("-3").is_err());
        assert_eq!(parse_positive("72.5"), Ok(72.5));
    }
}
