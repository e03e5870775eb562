use image::{GrayImage, ImageBuffer, Luma};

type Accumulator = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Running estimate of the static scene inside the ROI.
///
/// The first observation is copied into the accumulator directly; every
/// later one is blended in with an exponential moving average. Each
/// observation advances the tick counter, and once the counter reaches the
/// warm-up target the model freezes: further observations are ignored.
///
/// The hand must not be in the ROI while the model is warming up. That is a
/// usage precondition of the surrounding loop, not something enforced here.
pub struct BackgroundModel {
    accumulator: Option<Accumulator>,
    ticks: f32,
    warmup_ticks: f32,
    tick_increment: f32,
    learning_rate: f32,
}

impl BackgroundModel {
    pub fn new(warmup_ticks: f32, tick_increment: f32, learning_rate: f32) -> Self {
        Self {
            accumulator: None,
            ticks: 0.0,
            warmup_ticks,
            tick_increment,
            learning_rate,
        }
    }

    /// Feed one ROI sample into the model. No-op once the model is ready.
    pub fn observe(&mut self, sample: &GrayImage) {
        if self.is_ready() {
            return;
        }
        match self.accumulator.as_mut() {
            None => {
                let acc = Accumulator::from_fn(sample.width(), sample.height(), |x, y| {
                    Luma([f32::from(sample.get_pixel(x, y)[0])])
                });
                self.accumulator = Some(acc);
            }
            Some(acc) => {
                let alpha = self.learning_rate;
                for (acc_px, sample_px) in acc.pixels_mut().zip(sample.pixels()) {
                    acc_px[0] = (1.0 - alpha) * acc_px[0] + alpha * f32::from(sample_px[0]);
                }
            }
        }
        self.ticks += self.tick_increment;
        log::debug!(
            "background model at {:.1}/{:.1} ticks",
            self.ticks,
            self.warmup_ticks
        );
    }

    pub fn is_ready(&self) -> bool {
        self.ticks >= self.warmup_ticks
    }

    /// The learned background, rounded back to 8-bit. `None` before the
    /// first observation.
    pub fn current(&self) -> Option<GrayImage> {
        let acc = self.accumulator.as_ref()?;
        Some(GrayImage::from_fn(acc.width(), acc.height(), |x, y| {
            Luma([acc.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
        }))
    }
}
