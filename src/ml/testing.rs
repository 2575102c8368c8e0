// Test doubles shared by the aggregator and use-case tests.

use anyhow::Result;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::domain::detection::{ClassId, RawDetection};
use crate::domain::traits::{DetectionThresholds, Detector};

/// Replays scripted detections per (image, epoch) and counts calls.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    script:           HashMap<(String, u32), Vec<RawDetection>>,
    pub loads:        Vec<PathBuf>,
    pub detect_calls: usize,
}

impl ScriptedDetector {
    pub fn script(&mut self, image: &str, epoch: u32, detections: Vec<RawDetection>) {
        let detections = detections
            .into_iter()
            .map(|d| RawDetection { epoch, ..d })
            .collect();
        self.script.insert((image.to_string(), epoch), detections);
    }
}

impl Detector for ScriptedDetector {
    fn load_checkpoint(&mut self, checkpoint: &Path) -> Result<()> {
        self.loads.push(checkpoint.to_path_buf());
        Ok(())
    }

    fn detect(
        &mut self,
        image:       &Path,
        epoch:       u32,
        _thresholds: &DetectionThresholds,
    ) -> Result<Vec<RawDetection>> {
        self.detect_calls += 1;
        let key = (image.to_string_lossy().to_string(), epoch);
        Ok(self.script.get(&key).cloned().unwrap_or_default())
    }
}

/// Create `{dir}/images/{name}` and its label file listing `classes`.
/// Returns the image path as stored in test-set lists.
pub fn write_labeled_image(dir: &Path, name: &str, classes: &[ClassId]) -> String {
    let images = dir.join("images");
    let labels = dir.join("labels");
    fs::create_dir_all(&images).unwrap();
    fs::create_dir_all(&labels).unwrap();

    let image = images.join(name);
    fs::write(&image, b"").unwrap();

    let lines: String = classes
        .iter()
        .map(|c| format!("{c} 0.5 0.5 0.1 0.1\n"))
        .collect();
    fs::write(labels.join(Path::new(name).with_extension("txt")), lines).unwrap();

    image.to_string_lossy().to_string()
}
