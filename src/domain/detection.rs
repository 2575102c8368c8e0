// ============================================================
// Layer 3 — Detection Domain Types
// ============================================================
// The raw and aggregated outputs of the detector:
//
//   RawDetection      — one box from one checkpoint for one image
//   AggregatedRegion  — detections from several checkpoints that
//                       cover the same object, collapsed into a
//                       mean box with mean/std confidences
//
// Boxes are corner-form [x0, y0, x1, y1] in input-image pixels.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// Integer class id, an index into the run's class list.
pub type ClassId = usize;

/// Axis-aligned box in corner form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Box from a center point and size.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    pub fn area(&self) -> f32 {
        let w = (self.x1.max(self.x0) - self.x0.min(self.x1)).max(0.0);
        let h = (self.y1.max(self.y0) - self.y0.min(self.y1)).max(0.0);
        w * h
    }

    /// Intersection over union; corners may be given in either order.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter_x0 = self.x0.min(self.x1).max(other.x0.min(other.x1));
        let inter_y0 = self.y0.min(self.y1).max(other.y0.min(other.y1));
        let inter_x1 = self.x1.max(self.x0).min(other.x1.max(other.x0));
        let inter_y1 = self.y1.max(self.y0).min(other.y1.max(other.y0));

        let inter_w    = (inter_x1 - inter_x0).max(0.0);
        let inter_h    = (inter_y1 - inter_y0).max(0.0);
        let inter_area = inter_w * inter_h;

        let denom = self.area() + other.area() - inter_area;
        if denom <= 0.0 {
            0.0
        } else {
            inter_area / denom
        }
    }
}

/// One detector output for one image at one checkpoint epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox:       BoundingBox,
    /// Objectness confidence
    pub obj_conf:   f32,
    /// Confidence of the predicted class
    pub class_conf: f32,
    pub class_id:   ClassId,
    /// Epoch of the checkpoint that produced this detection
    pub epoch:      u32,
}

impl RawDetection {
    /// Objectness × class confidence
    pub fn score(&self) -> f32 {
        self.obj_conf * self.class_conf
    }
}

/// Detections for one image merged across a checkpoint window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRegion {
    pub bbox:           BoundingBox,
    pub obj_conf:       f32,
    pub class_conf:     f32,
    pub class_id:       ClassId,
    /// Standard deviation of objectness confidence across members (≥ 0)
    pub obj_conf_std:   f32,
    /// Standard deviation of class confidence across members (≥ 0)
    pub class_conf_std: f32,
    /// Number of detections merged into this region
    pub support:        usize,
}

impl AggregatedRegion {
    /// Combined confidence reported in result rows.
    pub fn score(&self) -> f32 {
        self.obj_conf * self.class_conf
    }

    /// Root-sum-square of the two component deviations.
    pub fn score_std(&self) -> f32 {
        (self.obj_conf_std.powi(2) + self.class_conf_std.powi(2)).sqrt()
    }
}
