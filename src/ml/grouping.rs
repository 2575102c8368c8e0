// ============================================================
// Layer 5 — Region Grouping and Matching
// ============================================================
// Default implementations of the RegionGrouper and RegionMatcher
// traits.
//
// Grouping (per image, all checkpoints of a window together):
//   1. Order detections by objectness × class confidence
//   2. The best unused detection seeds a region
//   3. Unused detections with IoU ≥ threshold against the seed
//      join it, at most one per checkpoint epoch
//   4. Region box and confidences are member means; std values
//      are population deviations (0 for a single member)
//
// Matching:
//   regions are visited best first; a region whose class is still
//   an unconsumed ground truth takes it, then leftover regions are
//   paired with leftover ground truths in order.

use std::collections::{BTreeMap, HashSet};

use crate::domain::detection::{AggregatedRegion, BoundingBox, ClassId, RawDetection};
use crate::domain::traits::{RegionGrouper, RegionMatch, RegionMatcher};

#[derive(Debug, Clone, Copy, Default)]
pub struct IouRegionGrouper;

impl RegionGrouper for IouRegionGrouper {
    fn group(
        &self,
        detections:  &[RawDetection],
        window_size: usize,
        iou_thresh:  f32,
    ) -> Vec<AggregatedRegion> {
        let capacity = window_size.max(1);
        let mut order: Vec<usize> = (0..detections.len()).collect();
        order.sort_by(|&a, &b| detections[b].score().total_cmp(&detections[a].score()));

        let mut used    = vec![false; detections.len()];
        let mut regions = Vec::new();

        for (pos, &seed) in order.iter().enumerate() {
            if used[seed] {
                continue;
            }
            used[seed] = true;

            let seed_box    = detections[seed].bbox;
            let mut members = vec![&detections[seed]];
            let mut epochs  = HashSet::from([detections[seed].epoch]);

            for &other in &order[pos + 1..] {
                if members.len() >= capacity {
                    break;
                }
                let det = &detections[other];
                if used[other] || epochs.contains(&det.epoch) {
                    continue;
                }
                if det.bbox.iou(&seed_box) >= iou_thresh {
                    used[other] = true;
                    epochs.insert(det.epoch);
                    members.push(det);
                }
            }

            regions.push(summarise(&members));
        }
        regions
    }
}

fn summarise(members: &[&RawDetection]) -> AggregatedRegion {
    let n = members.len() as f32;
    let mean = |f: &dyn Fn(&RawDetection) -> f32| members.iter().map(|d| f(*d)).sum::<f32>() / n;

    let bbox = BoundingBox::new(
        mean(&|d| d.bbox.x0),
        mean(&|d| d.bbox.y0),
        mean(&|d| d.bbox.x1),
        mean(&|d| d.bbox.y1),
    );
    let obj_conf   = mean(&|d| d.obj_conf);
    let class_conf = mean(&|d| d.class_conf);

    let std = |f: &dyn Fn(&RawDetection) -> f32, mu: f32| {
        (members.iter().map(|d| (f(*d) - mu).powi(2)).sum::<f32>() / n).sqrt()
    };

    AggregatedRegion {
        bbox,
        obj_conf,
        class_conf,
        class_id:       majority_class(members),
        obj_conf_std:   std(&|d| d.obj_conf, obj_conf),
        class_conf_std: std(&|d| d.class_conf, class_conf),
        support:        members.len(),
    }
}

/// Most frequent class among members; ties go to the seed's class,
/// then to the lowest id.
fn majority_class(members: &[&RawDetection]) -> ClassId {
    let seed_class = members[0].class_id;
    let mut counts: BTreeMap<ClassId, usize> = BTreeMap::new();
    for d in members {
        *counts.entry(d.class_id).or_default() += 1;
    }
    let best = counts.values().copied().max().unwrap_or(0);
    if counts.get(&seed_class) == Some(&best) {
        return seed_class;
    }
    counts
        .into_iter()
        .find(|(_, c)| *c == best)
        .map(|(class, _)| class)
        .unwrap_or(seed_class)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyClassMatcher;

impl RegionMatcher for GreedyClassMatcher {
    fn match_regions(
        &self,
        ground_truths: &[ClassId],
        regions:       &[AggregatedRegion],
    ) -> Vec<RegionMatch> {
        let mut order: Vec<usize> = (0..regions.len()).collect();
        order.sort_by(|&a, &b| regions[b].score().total_cmp(&regions[a].score()));

        let mut remaining = ground_truths.to_vec();
        let mut assigned: Vec<Option<ClassId>> = vec![None; regions.len()];

        for &r in &order {
            if let Some(pos) = remaining.iter().position(|&gt| gt == regions[r].class_id) {
                assigned[r] = Some(remaining.remove(pos));
            }
        }
        for &r in &order {
            if assigned[r].is_none() && !remaining.is_empty() {
                assigned[r] = Some(remaining.remove(0));
            }
        }

        order
            .into_iter()
            .map(|r| RegionMatch { truth: assigned[r], region: r })
            .collect()
    }
}
