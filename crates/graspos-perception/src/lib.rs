//! `graspos-perception` – geometric world model for the pick task.
//!
//! Turns the outputs of the external perception services (3-D segment fits
//! and 2-D visual detections) into the representations the task orchestrator
//! reasons about.
//!
//! # Modules
//!
//! - [`geometry`] – rigid poses with local-frame offsets, the ZYZ orientation
//!   composition used by the segment fitter, and axis-aligned 2-D rectangles
//!   with intersection-over-union.
//! - [`segment`] – the per-cycle data model: [`GeometricSegment`][segment::GeometricSegment]
//!   and [`VisionDetection`][segment::VisionDetection].
//! - [`fusion`] – best-overlap label fusion assigning detection categories to
//!   segments.
//! - [`shape`] – classifies a segment into a simplified collision primitive
//!   (box or cylinder) for the obstacle map.

pub mod fusion;
pub mod geometry;
pub mod segment;
pub mod shape;
