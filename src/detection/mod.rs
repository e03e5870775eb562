pub mod background;
pub mod contours;
pub mod geometry;
pub mod preprocessing;
pub mod segmentation;

use anyhow::{bail, Result};
use image::GrayImage;
use std::f64::consts::FRAC_PI_2;

use crate::models::FrameResult;
use self::background::BackgroundModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Warming,
    Ready,
}

/// Per-frame finger counting pipeline.
///
/// Feeds the first frames of the stream into the background model, then
/// runs segment -> select contour -> analyze on every later frame. The
/// warm-up to detection transition is irreversible; the hand must stay out
/// of the ROI until it has happened.
///
/// The caller owns capture and preprocessing: frames arrive here already
/// cropped to the ROI, grayscale and blurred (see [`preprocessing`]).
pub struct FingerCountPipeline {
    /// Tick count at which warm-up completes.
    pub warmup_ticks: f32,
    /// Ticks added per observed frame.
    pub tick_increment: f32,
    /// Background EMA weight for new samples.
    pub learning_rate: f32,
    /// Exclusive absolute-difference threshold for foreground pixels.
    pub diff_threshold: u8,
    /// Dilation/erosion radius applied to the foreground mask.
    pub morph_passes: u8,
    /// Hull-to-contour area excess (percent) above which a defect-free hand
    /// counts as one finger instead of zero.
    pub ratio_threshold: f64,
    /// Largest valley angle (radians) still counted as a gap between fingers.
    pub valley_angle_max: f64,
    background: BackgroundModel,
    stage: Stage,
    dimensions: Option<(u32, u32)>,
}

impl FingerCountPipeline {
    pub fn new() -> Self {
        let warmup_ticks = 70.0;
        let tick_increment = 1.5;
        let learning_rate = 0.5;
        Self {
            warmup_ticks,
            tick_increment,
            learning_rate,
            diff_threshold: 21,
            morph_passes: 2,
            ratio_threshold: 16.0,
            valley_angle_max: FRAC_PI_2,
            background: BackgroundModel::new(warmup_ticks, tick_increment, learning_rate),
            stage: Stage::Warming,
            dimensions: None,
        }
    }

    pub fn with_warmup_ticks(mut self, ticks: f32) -> Self {
        self.warmup_ticks = ticks;
        self.rebuild_background();
        self
    }

    pub fn with_tick_increment(mut self, increment: f32) -> Self {
        self.tick_increment = increment;
        self.rebuild_background();
        self
    }

    pub fn with_learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate;
        self.rebuild_background();
        self
    }

    pub fn with_diff_threshold(mut self, threshold: u8) -> Self {
        self.diff_threshold = threshold;
        self
    }

    pub fn with_ratio_threshold(mut self, threshold: f64) -> Self {
        self.ratio_threshold = threshold;
        self
    }

    pub fn with_valley_angle_max(mut self, radians: f64) -> Self {
        self.valley_angle_max = radians;
        self
    }

    /// Run one ROI frame through the pipeline.
    ///
    /// Returns [`FrameResult::WarmingUp`] while the background model is
    /// learning (including for the frame that completes warm-up), then
    /// `Ready(None)` when the mask holds no contour or the detected contour
    /// is too degenerate to analyze, and `Ready(Some(..))` otherwise.
    /// Fails only when the frame's dimensions differ from the stream's.
    pub fn process_frame(&mut self, roi: &GrayImage) -> Result<FrameResult> {
        let dims = (roi.width(), roi.height());
        match self.dimensions {
            None => self.dimensions = Some(dims),
            Some(expected) if expected != dims => bail!(
                "frame is {}x{} but the stream started at {}x{}",
                dims.0,
                dims.1,
                expected.0,
                expected.1
            ),
            Some(_) => {}
        }

        if self.stage == Stage::Warming {
            self.background.observe(roi);
            if self.background.is_ready() {
                self.stage = Stage::Ready;
                log::info!("background model ready, switching to detection");
            }
            return Ok(FrameResult::WarmingUp);
        }

        let Some(background) = self.background.current() else {
            // warm-up target of zero ticks and no observations yet
            return Ok(FrameResult::WarmingUp);
        };
        let mask = segmentation::segment(roi, &background, self.diff_threshold, self.morph_passes);
        let found = contours::extract_contours(&mask);
        let Some(hand) = contours::select_hand_contour(&found) else {
            return Ok(FrameResult::Ready(None));
        };
        let result = geometry::analyze(&hand.points, self.ratio_threshold, self.valley_angle_max);
        Ok(FrameResult::Ready(result))
    }

    fn rebuild_background(&mut self) {
        self.background =
            BackgroundModel::new(self.warmup_ticks, self.tick_increment, self.learning_rate);
    }
}

impl Default for FingerCountPipeline {
    fn default() -> Self {
        Self::new()
    }
}
