use std::path::{Path, PathBuf};

use image::{imageops, Rgba, RgbaImage};

use crate::rendering::domain::drawing_sink::DrawingSink;
use crate::shared::frame::{ColorFormat, Frame, Rotation};

const POINT_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const POINT_RADIUS: i64 = 1;

/// Writes every drawn frame as a numbered PNG with its landmark points
/// marked, rotated upright.
pub struct PngOverlaySink {
    dir: PathBuf,
    index: usize,
    warned_format: bool,
}

impl PngOverlaySink {
    pub fn new(dir: &Path) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            index: 0,
            warned_format: false,
        })
    }

    pub fn frames_written(&self) -> usize {
        self.index
    }

    fn to_image(frame: &Frame) -> Option<RgbaImage> {
        let (w, h) = (frame.width(), frame.height());
        let data = frame.data();
        let rgba: Vec<u8> = match frame.format() {
            ColorFormat::Rgba32 => data.to_vec(),
            ColorFormat::Rgb24 => data
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            ColorFormat::Bgra32 => data
                .chunks_exact(4)
                .flat_map(|p| [p[2], p[1], p[0], p[3]])
                .collect(),
            ColorFormat::Gray8 => data.iter().flat_map(|&v| [v, v, v, 255]).collect(),
            ColorFormat::YuvNv21 => return None,
        };
        RgbaImage::from_raw(w, h, rgba)
    }

    fn mark_points(img: &mut RgbaImage, points: &[(f32, f32)]) {
        let (w, h) = (img.width() as i64, img.height() as i64);
        for &(x, y) in points {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            let (cx, cy) = (x.round() as i64, y.round() as i64);
            for py in (cy - POINT_RADIUS)..=(cy + POINT_RADIUS) {
                for px in (cx - POINT_RADIUS)..=(cx + POINT_RADIUS) {
                    if (0..w).contains(&px) && (0..h).contains(&py) {
                        img.put_pixel(px as u32, py as u32, POINT_COLOR);
                    }
                }
            }
        }
    }

    fn upright(img: RgbaImage, rotation: Rotation) -> RgbaImage {
        match rotation {
            Rotation::None => img,
            Rotation::Cw90 => imageops::rotate90(&img),
            Rotation::Ccw90 => imageops::rotate270(&img),
            Rotation::Rotate180 => imageops::rotate180(&img),
        }
    }

    fn write(&mut self, frame: &Frame, points: Option<&[(f32, f32)]>) -> Result<(), Box<dyn std::error::Error>> {
        let Some(mut img) = Self::to_image(frame) else {
            if !self.warned_format {
                log::warn!(
                    "Overlay output does not support {:?} frames; skipping",
                    frame.format()
                );
                self.warned_format = true;
            }
            return Ok(());
        };
        if let Some(points) = points {
            Self::mark_points(&mut img, points);
        }
        let img = Self::upright(img, frame.rotation());

        let path = self.dir.join(format!("frame_{:06}.png", self.index));
        img.save(&path)?;
        self.index += 1;
        Ok(())
    }
}

impl DrawingSink for PngOverlaySink {
    fn draw(&mut self, frame: &Frame, points: Option<&[(f32, f32)]>) {
        if let Err(e) = self.write(frame, points) {
            log::error!("Failed to write overlay frame {}: {e}", self.index);
        }
    }
}
