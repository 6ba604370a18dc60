//! Collaborator traits: where frames, detections, and region samples come
//! from.

use crate::tracker::Detection;

/// One captured image in packed RGB8 layout (`width * height * 3` bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Capture time in seconds.
    pub timestamp: f64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp: f64) -> Self {
        Self {
            data,
            width,
            height,
            timestamp,
        }
    }

    /// True when `data` holds exactly `width * height` RGB pixels.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize * 3
    }
}

/// What a [`FrameSource`] yields for one frame slot.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    Ready(Frame),
    /// Upstream had nothing for this slot; the pipeline still advances.
    Skipped,
}

/// Strictly ordered producer of frames. Returning `None` ends the loop.
///
/// Implementations that capture or infer concurrently must re-serialize
/// frames into arrival order before yielding them.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<FrameInput>;
}

impl<I: Iterator<Item = FrameInput>> FrameSource for I {
    fn next_frame(&mut self) -> Option<FrameInput> {
        self.next()
    }
}

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the tracker.
/// Detections below the adapter's own confidence floor must already be
/// removed.
///
/// # Example
///
/// ```ignore
/// use robovision_track::{Detection, DetectionSource, Frame};
///
/// struct MyDetector;
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error: std::fmt::Display;

    /// Run inference on one frame and return its detections in a stable
    /// order.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error>;
}

/// Produces the scalar region coefficient in `[0, 1]` for a frame.
pub trait RegionSignalSource {
    type Error: std::fmt::Display;

    fn coefficient(&mut self, frame: &Frame) -> Result<f64, Self::Error>;
}
