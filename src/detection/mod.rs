mod categories;
mod detector;
mod device;
mod preprocess;

pub use categories::CategoryTable;
pub use detector::{DetectError, Detector, OnnxDetector};
pub use device::{DevicePreference, OrtProbe};
use preprocess::decode_frame;

/// Decodes an uploaded frame, runs the detector and names each detection.
pub fn label_frame(
    detector: &dyn Detector,
    categories: &CategoryTable,
    bytes: &[u8],
) -> Result<Vec<String>, DetectError> {
    let frame = decode_frame(bytes)?;
    let labels = detector.detect(&frame)?;
    tracing::debug!(
        labels = ?labels,
        width = frame.width(),
        height = frame.height(),
        "frame detections"
    );
    Ok(categories.names_for(&labels))
}
