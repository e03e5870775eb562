/// Finger count derived from one analyzed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerCount {
    /// Number of extended fingers (practically 0..=5).
    pub fingers: u32,
    /// Hull-to-contour area excess, in percent. Used to tell a closed fist
    /// (low excess) from a single extended finger when no valley qualifies.
    pub hull_excess_ratio: f64,
}

/// Outcome of feeding one ROI frame to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameResult {
    /// The background model is still learning; no detection was attempted.
    WarmingUp,
    /// Detection ran. `None` means no contour was found in the mask.
    Ready(Option<FingerCount>),
}

impl FrameResult {
    pub fn is_warming_up(&self) -> bool {
        matches!(self, FrameResult::WarmingUp)
    }

    /// The detected hand, if warm-up is over and a contour was found.
    pub fn hand(&self) -> Option<&FingerCount> {
        match self {
            FrameResult::Ready(Some(count)) => Some(count),
            _ => None,
        }
    }
}
