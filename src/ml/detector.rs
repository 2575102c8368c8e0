// ============================================================
// Layer 5 — Burn Detector
// ============================================================
// The Detector implementation used by the CLI. One network is
// built at start-up; each checkpoint replaces its weights through
// CompactRecorder + load_record, so a whole sweep runs on a single
// model allocation.
//
// Per image:
//   1. Load with the image crate, resize to img_size × img_size,
//      lay out as CHW floats in 0..1
//   2. Forward pass → [1, 5 + C, grid, grid]
//   3. decode_grid: one candidate box per cell, kept when its
//      objectness reaches obj_thresh, scaled back to the original
//      image size
//   4. non_max_suppression: greedy, per class
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{anyhow, bail, Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::TensorData,
};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};

use crate::domain::detection::{BoundingBox, RawDetection};
use crate::domain::traits::{DetectionThresholds, Detector};
use crate::ml::model::{DetectorNet, DetectorNetConfig, BOX_CHANNELS};

pub type InferBackend = burn::backend::Wgpu;

pub struct BurnDetector<B: Backend = InferBackend> {
    model:    DetectorNet<B>,
    config:   DetectorNetConfig,
    img_size: usize,
    device:   B::Device,
    loaded:   Option<PathBuf>,
}

impl<B: Backend> BurnDetector<B> {
    pub fn new(config: DetectorNetConfig, img_size: usize, device: B::Device) -> Self {
        let model = config.init(&device);
        tracing::debug!(
            "Detector built: {} classes, {}×{} grid, {}px input",
            config.num_classes,
            config.grid,
            config.grid,
            img_size
        );
        Self { model, config, img_size, device, loaded: None }
    }

    /// Read, resize and normalise one image. Returns the tensor and the
    /// original width and height.
    fn image_tensor(&self, image: &Path) -> Result<(Tensor<B, 4>, f32, f32)> {
        let img = image::open(image)
            .with_context(|| format!("Cannot open image '{}'", image.display()))?
            .to_rgb8();
        let (width, height) = img.dimensions();

        let side    = self.img_size as u32;
        let resized = image::imageops::resize(&img, side, side, FilterType::Triangle);

        let plane = self.img_size * self.img_size;
        let mut chw = vec![0.0_f32; 3 * plane];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let idx = y as usize * self.img_size + x as usize;
            for c in 0..3 {
                chw[c * plane + idx] = pixel[c] as f32 / 255.0;
            }
        }

        let data   = TensorData::new(chw, [1, 3, self.img_size, self.img_size]);
        let tensor = Tensor::<B, 4>::from_data(data, &self.device);
        Ok((tensor, width as f32, height as f32))
    }
}

impl<B: Backend> Detector for BurnDetector<B> {
    fn load_checkpoint(&mut self, checkpoint: &Path) -> Result<()> {
        if self.loaded.as_deref() == Some(checkpoint) {
            return Ok(());
        }

        let record = CompactRecorder::new()
            .load(checkpoint.to_path_buf(), &self.device)
            .with_context(|| format!("Cannot load checkpoint '{}'", checkpoint.display()))?;

        self.model  = self.model.clone().load_record(record);
        self.loaded = Some(checkpoint.to_path_buf());
        Ok(())
    }

    fn detect(
        &mut self,
        image:      &Path,
        epoch:      u32,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<RawDetection>> {
        if self.loaded.is_none() {
            bail!("No checkpoint loaded before detecting on '{}'", image.display());
        }

        let (input, width, height) = self.image_tensor(image)?;
        let output = self
            .model
            .forward(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read detector output: {e:?}"))?;

        let candidates = decode_grid(
            &output,
            self.config.grid,
            self.config.num_classes,
            (width, height),
            epoch,
            thresholds.obj_thresh,
        );
        let kept = non_max_suppression(candidates, thresholds.nms_thresh);
        tracing::debug!("{} detections on '{}'", kept.len(), image.display());
        Ok(kept)
    }
}

/// Decode a [5 + C, grid, grid] head output (channel-major) into boxes
/// in original image pixels. Cells below `obj_thresh` are dropped.
pub fn decode_grid(
    output:      &[f32],
    grid:        usize,
    num_classes: usize,
    image_size:  (f32, f32),
    epoch:       u32,
    obj_thresh:  f32,
) -> Vec<RawDetection> {
    let cells = grid * grid;
    if grid == 0 || num_classes == 0 || output.len() < (BOX_CHANNELS + num_classes) * cells {
        return Vec::new();
    }
    let (width, height) = image_size;
    let at = |channel: usize, cell: usize| output[channel * cells + cell];

    let mut detections = Vec::new();
    for cell in 0..cells {
        let obj_conf = at(4, cell);
        if obj_conf < obj_thresh {
            continue;
        }

        let (row, col) = (cell / grid, cell % grid);
        let cx = (col as f32 + at(0, cell)) / grid as f32 * width;
        let cy = (row as f32 + at(1, cell)) / grid as f32 * height;
        let w  = at(2, cell) * width;
        let h  = at(3, cell) * height;

        let (class_id, class_conf) = (0..num_classes)
            .map(|c| (c, at(BOX_CHANNELS + c, cell)))
            .fold((0, f32::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });

        detections.push(RawDetection {
            bbox: BoundingBox::from_center(cx, cy, w, h),
            obj_conf,
            class_conf,
            class_id,
            epoch,
        });
    }
    detections
}

/// Greedy per-class suppression, best score first.
pub fn non_max_suppression(mut detections: Vec<RawDetection>, nms_thresh: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.score().total_cmp(&a.score()));

    let mut kept: Vec<RawDetection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == det.class_id && k.bbox.iou(&det.bbox) > nms_thresh);
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}
