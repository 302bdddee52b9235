// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! 3D layout of a cell
//!
//! The layout is only consumed by external geometry/plotting tools; the cable
//! solver never reads it. Sections get `nseg + 1` points at segment
//! boundaries. The root runs along +x from the origin and every child is
//! fanned out in the xy-plane from its attachment point.

use core::f64::consts::PI;
use serde::{Deserialize, Serialize};

use super::tree::Morphology;
use crate::types::SectionId;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Point3) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        Point3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }
}

/// Placement of a cell: position plus rotation about the z axis (radians)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub theta: f64,
}

/// Per-section 3D points (with diameters) of one cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellGeometry {
    points: Vec<Vec<Point3>>,
    diameters: Vec<Vec<f64>>,
    position: Point3,
}

impl CellGeometry {
    /// Lay out a morphology at the origin
    pub fn define_shape(morphology: &Morphology) -> Self {
        let sections = morphology.sections();
        let mut points: Vec<Vec<Point3>> = vec![Vec::new(); sections.len()];
        let mut diameters: Vec<Vec<f64>> = vec![Vec::new(); sections.len()];
        let mut directions: Vec<(f64, f64)> = vec![(1.0, 0.0); sections.len()];

        // Sections are visited in segment order, which puts parents first
        let mut order: Vec<SectionId> = sections.iter().map(|s| s.id).collect();
        order.sort_by_key(|id| sections[id.index()].first_segment);

        for id in order {
            let section = &sections[id.index()];
            let spec = &section.spec;

            let (start, direction) = match section.parent {
                None => (Point3::ORIGIN, (1.0, 0.0)),
                Some((parent, position)) => {
                    let parent_points = &points[parent.index()];
                    let (first, last) = match (parent_points.first(), parent_points.last()) {
                        (Some(f), Some(l)) => (*f, *l),
                        _ => (Point3::ORIGIN, Point3::ORIGIN),
                    };
                    let siblings = &sections[parent.index()].children;
                    let rank = siblings.iter().position(|c| *c == id).unwrap_or(0);
                    let fan = (rank as f64 + 1.0) * PI / (siblings.len() as f64 + 1.0) - PI / 2.0;
                    let (dx, dy) = directions[parent.index()];
                    let (s, c) = fan.sin_cos();
                    (first.lerp(&last, position), (dx * c - dy * s, dx * s + dy * c))
                }
            };
            directions[id.index()] = direction;

            let n = spec.nseg as usize;
            let mut section_points = Vec::with_capacity(n + 1);
            let mut section_diameters = Vec::with_capacity(n + 1);
            for k in 0..=n {
                let x = k as f64 / n as f64;
                let along = x * spec.length;
                section_points.push(Point3::new(
                    start.x + direction.0 * along,
                    start.y + direction.1 * along,
                    start.z,
                ));
                section_diameters.push(spec.diameter.at(x));
            }
            points[id.index()] = section_points;
            diameters[id.index()] = section_diameters;
        }

        Self {
            points,
            diameters,
            position: Point3::ORIGIN,
        }
    }

    /// Rotate every point about the z axis through the origin
    pub fn rotate_z(&mut self, theta: f64) {
        let (s, c) = theta.sin_cos();
        for p in self.points.iter_mut().flatten() {
            let (x, y) = (p.x, p.y);
            p.x = x * c - y * s;
            p.y = x * s + y * c;
        }
    }

    /// Move the cell so its reference position becomes `(x, y, z)`
    pub fn set_position(&mut self, x: f64, y: f64, z: f64) {
        let (dx, dy, dz) = (x - self.position.x, y - self.position.y, z - self.position.z);
        for p in self.points.iter_mut().flatten() {
            p.x += dx;
            p.y += dy;
            p.z += dz;
        }
        self.position = Point3::new(x, y, z);
    }

    /// Rotation first, then translation
    pub fn apply_pose(&mut self, pose: &Pose) {
        self.rotate_z(pose.theta);
        self.set_position(pose.x, pose.y, pose.z);
    }

    pub fn position(&self) -> Point3 {
        self.position
    }

    pub fn section_points(&self, id: SectionId) -> &[Point3] {
        self.points.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn section_diameters(&self, id: SectionId) -> &[f64] {
        self.diameters.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Path length through a section's points (µm)
    pub fn section_length(&self, id: SectionId) -> f64 {
        self.section_points(id)
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }

    /// Lateral area of the frusta between consecutive points (µm²)
    pub fn section_surface_area(&self, id: SectionId) -> f64 {
        let points = self.section_points(id);
        let diams = self.section_diameters(id);
        points
            .windows(2)
            .zip(diams.windows(2))
            .map(|(p, d)| {
                let (r0, r1) = (d[0] / 2.0, d[1] / 2.0);
                let h = p[0].distance(&p[1]);
                PI * (r0 + r1) * ((r0 - r1).powi(2) + h * h).sqrt()
            })
            .sum()
    }
}
