use std::path::Path;

use thiserror::Error;

pub const BACKGROUND: &str = "__background__";

/// Background sentinel followed by the 80 COCO categories, indexed by label ID.
const COCO_CATEGORIES: [&str; 81] = [
    BACKGROUND,
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("failed to read categories file: {0}")]
    Io(#[from] std::io::Error),
    #[error("categories file contains no names")]
    Empty,
}

/// Maps model label IDs to category names.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    names: Vec<String>,
}

impl CategoryTable {
    pub fn coco() -> Self {
        Self {
            names: COCO_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Reads one name per line; the line number is the label ID. Blank lines
    /// are skipped, so placeholder slots need an explicit name such as `N/A`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CategoryError> {
        let content = std::fs::read_to_string(path)?;
        let names: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            return Err(CategoryError::Empty);
        }

        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn get(&self, label: i64) -> Option<&str> {
        usize::try_from(label)
            .ok()
            .and_then(|idx| self.names.get(idx))
            .map(String::as_str)
    }

    /// Names for each in-range label, keeping order and duplicates. Labels
    /// outside the table are dropped with a warning.
    pub fn names_for(&self, labels: &[i64]) -> Vec<String> {
        let mut names = Vec::with_capacity(labels.len());
        for &label in labels {
            match self.get(label) {
                Some(name) => names.push(name.to_string()),
                None => tracing::warn!(
                    label,
                    valid_range = %format!("0..{}", self.len()),
                    "label out of range, skipping"
                ),
            }
        }
        names
    }
}
