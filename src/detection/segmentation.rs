use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Difference an observation against the learned background and binarize.
///
/// A pixel is foreground when its absolute difference from the background
/// exceeds `diff_threshold` (exclusive, so a difference of exactly 21 stays
/// background at the default). The mask is then dilated and eroded by
/// `morph_passes` to smooth the silhouette and close small gaps.
/// Stateless; the two images must have identical dimensions.
pub fn segment(
    observation: &GrayImage,
    background: &GrayImage,
    diff_threshold: u8,
    morph_passes: u8,
) -> GrayImage {
    let mask = GrayImage::from_fn(observation.width(), observation.height(), |x, y| {
        let diff = background.get_pixel(x, y)[0].abs_diff(observation.get_pixel(x, y)[0]);
        if diff > diff_threshold {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });
    if morph_passes == 0 {
        return mask;
    }
    let dilated = dilate(&mask, Norm::LInf, morph_passes);
    erode(&dilated, Norm::LInf, morph_passes)
}
