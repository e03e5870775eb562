//! Frame preparation helpers for the capture side of the loop.
//!
//! The pipeline itself only consumes finished ROI images; these functions
//! cover the steps the CLI performs to produce them from raw camera frames.

use image::{DynamicImage, GrayImage};
use imageproc::filter::gaussian_blur_f32;

/// Convert a decoded frame to grayscale.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Apply Gaussian blur to reduce sensor noise before differencing.
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Cut the fixed region of interest out of the full frame.
pub fn crop_roi(img: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> GrayImage {
    image::imageops::crop_imm(img, x, y, width, height).to_image()
}

/// Flip horizontally so the on-screen view is not mirrored.
pub fn mirror(img: &GrayImage) -> GrayImage {
    image::imageops::flip_horizontal(img)
}
