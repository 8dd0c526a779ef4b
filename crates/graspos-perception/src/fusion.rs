//! Label Fusion Engine.
//!
//! Assigns detector class labels to geometric segments by best 2-D overlap.
//! The detector and the segment fitter run independently; the only thing
//! tying their outputs together is image-plane geometry, so each detection
//! is matched to the segment whose projected bounding box it overlaps most.
//!
//! The scan is detection-driven, not segment-driven: every detection picks
//! its best segment, and a later detection overwrites an earlier one that
//! landed on the same segment. A segment no detection overlaps stays
//! unlabelled (it is still an obstacle, just not a graspable target).
//!
//! # Example
//!
//! ```rust
//! use graspos_perception::fusion::fuse;
//! use graspos_perception::geometry::{Rect, Vec3};
//! use graspos_perception::segment::{GeometricSegment, VisionDetection};
//!
//! let seg = GeometricSegment {
//!     id: 1,
//!     center: Vec3::zero(),
//!     roll: 0.0, pitch: 0.0, yaw: 0.0,
//!     a1: 0.05, a2: 0.05, a3: 0.05,
//!     e1: 0.1, e2: 0.1,
//!     bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
//! };
//! let det = VisionDetection {
//!     category: "cup".to_string(),
//!     bbox: Rect::new(1.0, 1.0, 11.0, 11.0),
//! };
//!
//! let labels = fuse(&[det], &[seg]);
//! assert_eq!(labels.get(&1).map(String::as_str), Some("cup"));
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use graspos_types::SegmentId;

use crate::segment::{GeometricSegment, VisionDetection};

/// Segment id → detector category, ordered by id so iteration (and any
/// first-match scan over it) is deterministic.
pub type CategoryMap = BTreeMap<SegmentId, String>;

/// Fuse detector labels onto segments by maximum intersection-over-union.
///
/// For each detection, the segment with the highest IoU against the
/// detection's box wins; ties keep the first-encountered (lowest-index)
/// segment because only a strictly greater IoU displaces the running best.
/// A maximum of exactly zero means the detection overlaps nothing and is
/// dropped. Empty inputs produce an empty map.
///
/// O(n·m) over detections × segments; at tens of each, no spatial index is
/// warranted.
pub fn fuse(detections: &[VisionDetection], segments: &[GeometricSegment]) -> CategoryMap {
    let mut labels = CategoryMap::new();

    for detection in detections {
        let mut best_iou = 0.0_f32;
        let mut best_id: Option<SegmentId> = None;

        for segment in segments {
            let iou = detection.bbox.intersection_over_union(segment.bbox);
            if iou > best_iou {
                best_iou = iou;
                best_id = Some(segment.id);
            }
        }

        if let Some(id) = best_id {
            debug!(
                category = %detection.category,
                segment = id,
                iou = best_iou,
                "fused detection onto segment"
            );
            labels.insert(id, detection.category.clone());
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Vec3};

    fn seg(id: SegmentId, bbox: Rect) -> GeometricSegment {
        GeometricSegment {
            id,
            center: Vec3::zero(),
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            a1: 0.05,
            a2: 0.05,
            a3: 0.05,
            e1: 0.1,
            e2: 0.1,
            bbox,
        }
    }

    fn det(category: &str, bbox: Rect) -> VisionDetection {
        VisionDetection {
            category: category.to_string(),
            bbox,
        }
    }

    #[test]
    fn detection_labels_best_overlapping_segment_only() {
        let segments = [
            seg(1, Rect::new(0.0, 0.0, 10.0, 10.0)),
            seg(2, Rect::new(100.0, 100.0, 110.0, 110.0)),
        ];
        let detections = [det("cup", Rect::new(0.0, 0.0, 10.0, 10.0))];

        let labels = fuse(&detections, &segments);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get(&1).map(String::as_str), Some("cup"));
        assert!(!labels.contains_key(&2));
    }

    #[test]
    fn no_overlap_yields_no_assignment() {
        let segments = [seg(1, Rect::new(0.0, 0.0, 10.0, 10.0))];
        let detections = [det("cup", Rect::new(50.0, 50.0, 60.0, 60.0))];
        assert!(fuse(&detections, &segments).is_empty());
    }

    #[test]
    fn later_detection_overwrites_earlier_on_same_segment() {
        let segments = [seg(1, Rect::new(0.0, 0.0, 10.0, 10.0))];
        let detections = [
            det("cup", Rect::new(0.0, 0.0, 10.0, 10.0)),
            det("mug", Rect::new(0.0, 0.0, 10.0, 10.0)),
        ];

        let labels = fuse(&detections, &segments);
        assert_eq!(labels.get(&1).map(String::as_str), Some("mug"));
    }

    #[test]
    fn iou_tie_keeps_first_segment() {
        // Two segments with identical boxes: the strict `>` comparison keeps
        // the first one scanned.
        let shared = Rect::new(0.0, 0.0, 10.0, 10.0);
        let segments = [seg(4, shared), seg(9, shared)];
        let detections = [det("cup", shared)];

        let labels = fuse(&detections, &segments);
        assert_eq!(labels.get(&4).map(String::as_str), Some("cup"));
        assert!(!labels.contains_key(&9));
    }

    #[test]
    fn each_detection_picks_its_own_best() {
        let segments = [
            seg(1, Rect::new(0.0, 0.0, 10.0, 10.0)),
            seg(2, Rect::new(20.0, 0.0, 30.0, 10.0)),
        ];
        let detections = [
            det("cup", Rect::new(1.0, 0.0, 11.0, 10.0)),
            det("bottle", Rect::new(19.0, 0.0, 29.0, 10.0)),
        ];

        let labels = fuse(&detections, &segments);
        assert_eq!(labels.get(&1).map(String::as_str), Some("cup"));
        assert_eq!(labels.get(&2).map(String::as_str), Some("bottle"));
    }

    #[test]
    fn empty_inputs_yield_empty_map() {
        assert!(fuse(&[], &[]).is_empty());
        assert!(fuse(&[det("cup", Rect::new(0.0, 0.0, 1.0, 1.0))], &[]).is_empty());
        assert!(fuse(&[], &[seg(1, Rect::new(0.0, 0.0, 1.0, 1.0))]).is_empty());
    }

    #[test]
    fn map_iterates_in_segment_id_order() {
        let segments = [
            seg(9, Rect::new(0.0, 0.0, 10.0, 10.0)),
            seg(2, Rect::new(20.0, 0.0, 30.0, 10.0)),
        ];
        let detections = [
            det("plate", Rect::new(0.0, 0.0, 10.0, 10.0)),
            det("bowl", Rect::new(20.0, 0.0, 30.0, 10.0)),
        ];

        let labels = fuse(&detections, &segments);
        let ids: Vec<SegmentId> = labels.keys().copied().collect();
        assert_eq!(ids, vec![2, 9]);
    }
}
