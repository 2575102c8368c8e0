// ============================================================
// Layer 5 — Grid Detector Network
// ============================================================
// A small single-shot detector. The image is reduced to a
// grid × grid feature map; every cell predicts one box:
//
//   input   [B, 3, img, img]       RGB scaled to 0..1
//   stem    conv 3×3 stride 2 → relu
//   body    conv 3×3 stride 2 → relu
//   pool    adaptive avg → [B, 2h, grid, grid]
//   head    conv 1×1 → [B, 5 + C, grid, grid] → sigmoid
//
// Head channels per cell, all in 0..1:
//   0 cx offset in cell   1 cy offset in cell
//   2 width / image       3 height / image
//   4 objectness          5.. class confidences
//
// Only the layout matters to the rest of the crate; decoding
// lives in ml::detector.
//
// Reference: Burn Book §3 (Building Blocks)
//            Redmon et al. (2016) You Only Look Once

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

/// Box geometry and objectness channels before the class scores.
pub const BOX_CHANNELS: usize = 5;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct DetectorNetConfig {
    pub num_classes: usize,
    #[config(default = 7)]
    pub grid:        usize,
    #[config(default = 32)]
    pub hidden:      usize,
}

impl DetectorNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DetectorNet<B> {
        let stem = Conv2dConfig::new([3, self.hidden], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let body = Conv2dConfig::new([self.hidden, self.hidden * 2], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let pool = AdaptiveAvgPool2dConfig::new([self.grid, self.grid]).init();
        let head = Conv2dConfig::new([self.hidden * 2, self.head_channels()], [1, 1])
            .with_padding(PaddingConfig2d::Valid)
            .init(device);
        DetectorNet { stem, body, pool, head }
    }

    pub fn head_channels(&self) -> usize {
        BOX_CHANNELS + self.num_classes
    }
}

#[derive(Module, Debug)]
pub struct DetectorNet<B: Backend> {
    pub stem: Conv2d<B>,
    pub body: Conv2d<B>,
    pub pool: AdaptiveAvgPool2d,
    pub head: Conv2d<B>,
}

impl<B: Backend> DetectorNet<B> {
    /// images: [batch, 3, H, W] → [batch, 5 + C, grid, grid], all in 0..1
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.stem.forward(images));
        let x = relu(self.body.forward(x));
        let x = self.pool.forward(x);
        sigmoid(self.head.forward(x))
    }
}
