use std::sync::{Mutex, MutexGuard, PoisonError};

use image::RgbImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use thiserror::Error;

use crate::config::ModelConfig;

use super::device::Device;
use super::preprocess::to_input_tensor;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("frame has zero width or height")]
    EmptyFrame,
    #[error("onnx runtime error: {0}")]
    Runtime(#[from] ort::Error),
    #[error("model has no output named '{0}'")]
    MissingOutput(String),
}

/// Produces the label ID of every object instance found in a frame, in the
/// order the model emits them.
pub trait Detector: Send + Sync {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<i64>, DetectError>;
}

pub struct OnnxDetector {
    session: Mutex<Session>,
    labels_output: String,
    device: Device,
}

impl OnnxDetector {
    pub fn load(config: &ModelConfig, device: Device) -> Result<Self, DetectError> {
        let builder = Session::builder()?
            .with_execution_providers(device.execution_providers())?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?;

        let source = config.path.as_str();
        let session = if source.starts_with("http://") || source.starts_with("https://") {
            builder.commit_from_url(source)?
        } else {
            builder.commit_from_file(source)?
        };

        tracing::info!(
            model = %source,
            device = %device,
            labels_output = %config.labels_output,
            "detection model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            labels_output: config.labels_output.clone(),
            device,
        })
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

impl Detector for OnnxDetector {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<i64>, DetectError> {
        let input = to_input_tensor(frame)?;
        let tensor_ref = TensorRef::from_array_view(input.view())?.into_dyn();

        let mut session = lock_session(&self.session);
        let outputs = session.run(ort::inputs![tensor_ref])?;

        // Boxes and scores are also produced; only the labels are consumed.
        let labels = outputs
            .get(self.labels_output.as_str())
            .ok_or_else(|| DetectError::MissingOutput(self.labels_output.clone()))?
            .try_extract_array::<i64>()?;

        Ok(labels.iter().copied().collect())
    }
}

/// Runs keep no per-request state in the session, so a panic in another
/// request leaves it usable.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lock_survives_panic_in_another_run() {
        let session = Arc::new(Mutex::new(0u32));

        let poisoner = Arc::clone(&session);
        let result = std::thread::spawn(move || {
            let _guard = lock_session(&poisoner);
            panic!("inference panicked while holding the session");
        })
        .join();
        assert!(result.is_err());
        assert!(session.is_poisoned());

        *lock_session(&session) += 1;
        *lock_session(&session) += 1;
        assert_eq!(*lock_session(&session), 2);
    }
}
