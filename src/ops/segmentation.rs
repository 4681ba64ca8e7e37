// ============================================================================
// SUBJECT SEGMENTATION - foreground masks for background replacement
// ============================================================================
//
// `SubjectSegmenter` is the seam for any segmentation backend. The built-in
// `BorderKeySegmenter` estimates the backdrop colour from the image border and
// classifies every pixel by its colour distance to it.
// ============================================================================

use image::{GrayImage, Luma, RgbaImage};
use rayon::prelude::*;

use super::filters::blur_mask;

/// Errors a segmentation backend can report. The pipeline treats all of them
/// as "no replacement possible" and keeps the effected image.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationError {
    EmptyImage,
    NoSubject,
    Backend(String),
}

impl std::fmt::Display for SegmentationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentationError::EmptyImage => write!(f, "image has no pixels"),
            SegmentationError::NoSubject => write!(f, "no foreground subject detected"),
            SegmentationError::Backend(e) => write!(f, "segmentation backend failed: {}", e),
        }
    }
}

impl std::error::Error for SegmentationError {}

/// Produces a soft mask (255 = subject, 0 = background) with the same extent
/// as the input image.
pub trait SubjectSegmenter: Send + Sync {
    fn segment(&self, image: &RgbaImage) -> Result<GrayImage, SegmentationError>;
}

/// Whether any pixel of the mask belongs to the subject.
pub fn has_foreground(mask: &GrayImage) -> bool {
    mask.as_raw().iter().any(|&v| v > 0)
}

/// Fraction of the mask that is confidently subject or background.
/// Values near 1.0 mean a crisp, decisive mask.
pub fn mask_confidence_score(mask: &GrayImage) -> f64 {
    let raw = mask.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let decisive = raw.iter().filter(|&&v| !(26..=229).contains(&v)).count();
    decisive as f64 / raw.len() as f64
}

/// Post-processing applied to the raw distance map.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationSettings {
    /// Normalised colour distance (0..1) above which a pixel counts as
    /// subject. Default: 0.18.
    pub threshold: f32,
    /// Smooth alpha ramp around the threshold instead of a hard cutoff.
    pub smooth_edges: bool,
    /// Gaussian feather applied to the finished mask, in pixels.
    pub edge_feather: f32,
    /// Minimum fraction of subject pixels; below this the result is treated
    /// as "no subject". Default: 0.002.
    pub min_coverage: f32,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            threshold: 0.18,
            smooth_edges: true,
            edge_feather: 1.0,
            min_coverage: 0.002,
        }
    }
}

/// Width of the smooth ramp on either side of the threshold.
const EDGE_RAMP: f32 = 0.05;

/// Largest possible RGB euclidean distance.
const MAX_RGB_DISTANCE: f32 = 441.672_96;

#[derive(Clone, Debug, Default)]
pub struct BorderKeySegmenter {
    pub settings: SegmentationSettings,
}

impl BorderKeySegmenter {
    pub fn new(settings: SegmentationSettings) -> Self {
        Self { settings }
    }

    /// Average colour of the opaque border pixels.
    fn backdrop_color(image: &RgbaImage) -> Option<[f32; 3]> {
        let (w, h) = image.dimensions();
        let mut sum = [0.0f64; 3];
        let mut count = 0u64;
        let mut add = |x: u32, y: u32| {
            let p = image.get_pixel(x, y);
            if p[3] > 0 {
                sum[0] += p[0] as f64;
                sum[1] += p[1] as f64;
                sum[2] += p[2] as f64;
                count += 1;
            }
        };
        for x in 0..w {
            add(x, 0);
            if h > 1 {
                add(x, h - 1);
            }
        }
        for y in 1..h.saturating_sub(1) {
            add(0, y);
            if w > 1 {
                add(w - 1, y);
            }
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some([(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32])
    }
}

impl SubjectSegmenter for BorderKeySegmenter {
    fn segment(&self, image: &RgbaImage) -> Result<GrayImage, SegmentationError> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(SegmentationError::EmptyImage);
        }
        let backdrop = Self::backdrop_color(image).ok_or(SegmentationError::NoSubject)?;
        let threshold = self.settings.threshold.clamp(0.0, 1.0);
        let smooth = self.settings.smooth_edges;

        let src = image.as_raw();
        let stride = w as usize;
        let mut raw = vec![0u8; (w * h) as usize];
        raw.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let pi = (y * stride + x) * 4;
                if src[pi + 3] == 0 {
                    *out = 0;
                    continue;
                }
                let dr = src[pi] as f32 - backdrop[0];
                let dg = src[pi + 1] as f32 - backdrop[1];
                let db = src[pi + 2] as f32 - backdrop[2];
                let dist = (dr * dr + dg * dg + db * db).sqrt() / MAX_RGB_DISTANCE;
                let p = if smooth {
                    ((dist - (threshold - EDGE_RAMP)) / (2.0 * EDGE_RAMP)).clamp(0.0, 1.0)
                } else if dist > threshold {
                    1.0
                } else {
                    0.0
                };
                *out = (p * 255.0).round() as u8;
            }
        });

        let mut mask = GrayImage::from_raw(w, h, raw).ok_or(SegmentationError::EmptyImage)?;
        if self.settings.edge_feather > 0.0 {
            mask = blur_mask(&mask, self.settings.edge_feather);
        }

        let subject = mask.pixels().filter(|p| p[0] >= 128).count();
        let coverage = subject as f32 / (w * h) as f32;
        log::debug!(
            "segmentation: coverage {:.3}, confidence {:.3}",
            coverage,
            mask_confidence_score(&mask)
        );
        if coverage < self.settings.min_coverage {
            return Err(SegmentationError::NoSubject);
        }
        Ok(mask)
    }
}

/// Segmenter that always yields the same mask. Handy when the subject is
/// already known (and in tests).
pub struct FixedMaskSegmenter {
    pub mask: GrayImage,
}

impl SubjectSegmenter for FixedMaskSegmenter {
    fn segment(&self, image: &RgbaImage) -> Result<GrayImage, SegmentationError> {
        if self.mask.dimensions() != image.dimensions() {
            return Err(SegmentationError::Backend(format!(
                "mask is {:?}, image is {:?}",
                self.mask.dimensions(),
                image.dimensions()
            )));
        }
        Ok(self.mask.clone())
    }
}

/// An all-background mask of the given size.
pub fn empty_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn subject_on_backdrop() -> RgbaImage {
        RgbaImage::from_fn(30, 30, |x, y| {
            if (10..20).contains(&x) && (10..20).contains(&y) {
                Rgba([220, 30, 30, 255])
            } else {
                Rgba([20, 200, 40, 255])
            }
        })
    }

    #[test]
    fn finds_centre_square() {
        let seg = BorderKeySegmenter::default();
        let mask = seg.segment(&subject_on_backdrop()).expect("mask");
        assert!(mask.get_pixel(15, 15)[0] > 200);
        assert_eq!(mask.get_pixel(1, 1)[0], 0);
    }

    #[test]
    fn uniform_image_has_no_subject() {
        let seg = BorderKeySegmenter::default();
        let img = RgbaImage::from_pixel(12, 12, Rgba([90, 90, 90, 255]));
        assert_eq!(seg.segment(&img), Err(SegmentationError::NoSubject));
    }

    #[test]
    fn empty_image_is_an_error() {
        let seg = BorderKeySegmenter::default();
        assert_eq!(seg.segment(&RgbaImage::new(0, 0)), Err(SegmentationError::EmptyImage));
    }
}
