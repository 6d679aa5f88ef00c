use image::{Rgba, RgbaImage};
use nalgebra::Matrix3;
use tracing::{debug, warn};

use crate::geometry::{transform_point, AlignmentTransform, PleatWarpPoint};

/// Alpha threshold below which a garment pixel counts as background
const CONTENT_ALPHA: u8 = 10;

/// Image with RGB premultiplied by alpha, for interpolation without dark fringes
struct Premultiplied {
    width: u32,
    height: u32,
    pixels: Vec<[f64; 4]>,
}

impl Premultiplied {
    fn from_image(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.pixels().map(|p| premultiply(*p)).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        x >= -0.5 && x <= self.width as f64 - 0.5 && y >= -0.5 && y <= self.height as f64 - 0.5
    }

    /// Bicubic sample with edge clamping
    fn sample(&self, x: f64, y: f64) -> [f64; 4] {
        let x_floor = x.floor() as i64;
        let y_floor = y.floor() as i64;
        let wx = cubic_weight(x - x.floor());
        let wy = cubic_weight(y - y.floor());

        let mut result = [0.0; 4];
        for (j, weight_y) in wy.iter().enumerate() {
            let py = (y_floor + j as i64 - 1).clamp(0, self.height as i64 - 1) as u32;
            for (i, weight_x) in wx.iter().enumerate() {
                let px = (x_floor + i as i64 - 1).clamp(0, self.width as i64 - 1) as u32;
                let texel = self.pixels[(py * self.width + px) as usize];
                let weight = weight_x * weight_y;
                for c in 0..4 {
                    result[c] += texel[c] * weight;
                }
            }
        }
        result
    }
}

fn premultiply(pixel: Rgba<u8>) -> [f64; 4] {
    let alpha = pixel[3] as f64 / 255.0;
    [
        pixel[0] as f64 * alpha,
        pixel[1] as f64 * alpha,
        pixel[2] as f64 * alpha,
        pixel[3] as f64,
    ]
}

fn unpremultiply(premultiplied: [f64; 4]) -> Rgba<u8> {
    let alpha = premultiplied[3];
    if alpha < 1.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let alpha_norm = alpha / 255.0;
    let channel = |v: f64| (v / alpha_norm).round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(premultiplied[0]),
        channel(premultiplied[1]),
        channel(premultiplied[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    ])
}

/// Catmull-Rom weights for the four taps around a fractional offset
fn cubic_weight(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;

    [
        -0.5 * t3 + t2 - 0.5 * t,
        1.5 * t3 - 2.5 * t2 + 1.0,
        -1.5 * t3 + 2.0 * t2 + 0.5 * t,
        0.5 * t3 - 0.5 * t2,
    ]
}

/// Bounding box (x, y, width, height) of pixels at or above the alpha threshold
pub fn find_content_bounds(img: &RgbaImage, alpha_threshold: u8) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[3] < alpha_threshold {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    bounds.map(|(min_x, min_y, max_x, max_y)| (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Crop away transparent padding; fully transparent images are returned unchanged
pub fn crop_to_content(img: &RgbaImage) -> RgbaImage {
    match find_content_bounds(img, CONTENT_ALPHA) {
        Some((x, y, width, height)) => {
            image::imageops::crop_imm(img, x, y, width, height).to_image()
        }
        None => img.clone(),
    }
}

/// Resize so the width equals `target_width`, keeping the aspect ratio
pub fn resize_to_width(img: &RgbaImage, target_width: u32) -> RgbaImage {
    let (width, height) = img.dimensions();

    if width == 0 || height == 0 || target_width == 0 {
        return img.clone();
    }

    let scale = target_width as f64 / width as f64;
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    let source = Premultiplied::from_image(img);

    RgbaImage::from_fn(target_width, new_height, |out_x, out_y| {
        let src_x = (out_x as f64 + 0.5) / scale - 0.5;
        let src_y = (out_y as f64 + 0.5) / scale - 0.5;
        unpremultiply(source.sample(src_x, src_y))
    })
}

/// Normalise a garment cut-out before placement
pub fn prepare_garment(img: &RgbaImage, target_width: u32) -> RgbaImage {
    let cropped = crop_to_content(img);
    let resized = resize_to_width(&cropped, target_width);
    debug!(
        "Garment prepared: {}x{} -> crop {}x{} -> {}x{}",
        img.width(),
        img.height(),
        cropped.width(),
        cropped.height(),
        resized.width(),
        resized.height()
    );
    resized
}

/// Warp at a body fraction, linearly interpolated and held flat past the ends
fn warp_at(samples: &[PleatWarpPoint], t: f64) -> f64 {
    let first = samples[0];
    let last = samples[samples.len() - 1];
    if t <= first.point {
        return first.warp;
    }
    if t >= last.point {
        return last.warp;
    }

    samples
        .windows(2)
        .find(|pair| t <= pair[1].point)
        .map(|pair| {
            let span = pair[1].point - pair[0].point;
            if span <= 0.0 {
                return pair[1].warp;
            }
            let f = (t - pair[0].point) / span;
            pair[0].warp + (pair[1].warp - pair[0].warp) * f
        })
        .unwrap_or(last.warp)
}

/// Stretch each garment row about the center column to follow the body's width profile.
///
/// Rows are mapped top to bottom onto body fractions 0..1; stretch is relative to the
/// first (shoulder) sample so the top edge keeps its width.
pub fn apply_pleat_warp(img: &RgbaImage, samples: &[PleatWarpPoint]) -> RgbaImage {
    let (width, height) = img.dimensions();
    if samples.len() < 2 || width == 0 || height == 0 || samples[0].warp <= 0.0 {
        return img.clone();
    }

    let base = samples[0].warp;
    let row_stretch: Vec<f64> = (0..height)
        .map(|y| warp_at(samples, (y as f64 + 0.5) / height as f64) / base)
        .collect();
    let max_stretch = row_stretch.iter().copied().fold(1.0, f64::max);
    let new_width = ((width as f64 * max_stretch).ceil() as u32).min(width * 4);

    debug!(
        "Pleat warp: {} samples, max stretch {:.3}, {}x{} -> {}x{}",
        samples.len(),
        max_stretch,
        width,
        height,
        new_width,
        height
    );

    let source = Premultiplied::from_image(img);
    let src_center = width as f64 / 2.0;
    let dst_center = new_width as f64 / 2.0;

    RgbaImage::from_fn(new_width, height, |out_x, out_y| {
        let stretch = row_stretch[out_y as usize];
        if stretch <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let src_x = src_center + (out_x as f64 + 0.5 - dst_center) / stretch - 0.5;
        let src_y = out_y as f64;
        if source.contains(src_x, src_y) {
            unpremultiply(source.sample(src_x, src_y))
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Garment-to-photo matrix: the garment's top-center lands on the transform's translation
pub fn placement_matrix(transform: &AlignmentTransform, garment_width: u32) -> Matrix3<f64> {
    #[rustfmt::skip]
    let anchor = Matrix3::new(
        1.0, 0.0, -(garment_width as f64) / 2.0,
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,
    );
    transform.to_matrix() * anchor
}

/// Photo-space bounding box of the placed garment, clamped to the photo
fn placed_bounds(
    matrix: &Matrix3<f64>,
    garment: (u32, u32),
    photo: (u32, u32),
) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = (garment.0 as f64, garment.1 as f64);
    let corners =
        [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)].map(|(x, y)| transform_point(matrix, x, y));

    let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let x0 = min_x.floor().max(0.0);
    let y0 = min_y.floor().max(0.0);
    let x1 = max_x.ceil().min(photo.0 as f64);
    let y1 = max_y.ceil().min(photo.1 as f64);
    if !(x0 < x1 && y0 < y1) {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

/// Composite the garment over the photo using inverse mapping and bicubic sampling
pub fn overlay_garment(
    photo: &RgbaImage,
    garment: &RgbaImage,
    transform: &AlignmentTransform,
) -> RgbaImage {
    let mut output = photo.clone();
    let forward = placement_matrix(transform, garment.width());

    let Some(inverse) = forward.try_inverse() else {
        warn!("Placement matrix is singular, leaving photo unchanged");
        return output;
    };

    let Some((x0, y0, x1, y1)) = placed_bounds(&forward, garment.dimensions(), photo.dimensions())
    else {
        debug!("Garment falls outside the photo");
        return output;
    };

    debug!("Overlay region: ({}, {}) to ({}, {})", x0, y0, x1, y1);

    let source = Premultiplied::from_image(garment);
    for y in y0..y1 {
        for x in x0..x1 {
            let (src_x, src_y) = transform_point(&inverse, x as f64, y as f64);
            if !source.contains(src_x, src_y) {
                continue;
            }

            let fg = source.sample(src_x, src_y);
            let fg_alpha = (fg[3] / 255.0).clamp(0.0, 1.0);
            if fg_alpha <= 0.0 {
                continue;
            }

            let bg = premultiply(*output.get_pixel(x, y));
            let mut blended = [0.0; 4];
            for c in 0..4 {
                blended[c] = fg[c].max(0.0) + bg[c] * (1.0 - fg_alpha);
            }
            output.put_pixel(x, y, unpremultiply(blended));
        }
    }

    output
}
