// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Compartment tree construction
//!
//! ```text
//! create(soma) ──┐
//! create(dend)   ├─ attach(dend, soma, 0.3) ─ finalize() ─> Morphology
//! create(axon) ──┘  attach(axon, soma, 0.0)
//! ```
//!
//! Structural mistakes (unknown sections, positions outside [0, 1], a second
//! parent, cycles, more than one root) are reported as `InvalidTopology`.

use ahash::AHashMap;

use super::section::{Section, SectionSpec, Segment};
use crate::types::error::require_unit_interval;
use crate::types::{Result, SectionId, SimError};

#[derive(Debug, Clone)]
struct PendingSection {
    spec: SectionSpec,
    parent: Option<(SectionId, f64)>,
}

/// Builder for a rooted, acyclic tree of sections
#[derive(Debug, Clone, Default)]
pub struct CompartmentTree {
    sections: Vec<PendingSection>,
    by_name: AHashMap<String, SectionId>,
}

impl CompartmentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section. Names must be unique within a tree.
    pub fn create(&mut self, spec: SectionSpec) -> Result<SectionId> {
        spec.validate()?;
        if self.by_name.contains_key(&spec.name) {
            return Err(SimError::InvalidTopology(format!(
                "section '{}' already exists",
                spec.name
            )));
        }
        let id = SectionId(self.sections.len() as u32);
        self.by_name.insert(spec.name.clone(), id);
        self.sections.push(PendingSection { spec, parent: None });
        Ok(id)
    }

    /// Attach `child`'s 0-end to `parent` at normalized `parent_position`.
    pub fn attach(&mut self, child: SectionId, parent: SectionId, parent_position: f64) -> Result<()> {
        let count = self.sections.len();
        if parent.index() >= count {
            return Err(SimError::InvalidTopology(format!(
                "parent {} does not exist",
                parent
            )));
        }
        if child.index() >= count {
            return Err(SimError::InvalidTopology(format!(
                "child {} does not exist",
                child
            )));
        }
        if !(0.0..=1.0).contains(&parent_position) {
            return Err(SimError::InvalidTopology(format!(
                "attach position {} on '{}' is outside [0, 1]",
                parent_position, self.sections[parent.index()].spec.name
            )));
        }
        if child == parent {
            return Err(SimError::InvalidTopology(format!(
                "section '{}' cannot attach to itself",
                self.sections[child.index()].spec.name
            )));
        }
        if let Some((existing, _)) = self.sections[child.index()].parent {
            return Err(SimError::InvalidTopology(format!(
                "section '{}' is already attached to '{}'",
                self.sections[child.index()].spec.name,
                self.sections[existing.index()].spec.name
            )));
        }

        // Walking up from the parent must never reach the child
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(SimError::InvalidTopology(format!(
                    "attaching '{}' to '{}' would create a cycle",
                    self.sections[child.index()].spec.name,
                    self.sections[parent.index()].spec.name
                )));
            }
            cursor = self.sections[current.index()].parent.map(|(p, _)| p);
        }

        self.sections[child.index()].parent = Some((parent, parent_position));
        Ok(())
    }

    /// Name-based variant of [`attach`](Self::attach)
    pub fn attach_by_name(&mut self, child: &str, parent: &str, parent_position: f64) -> Result<()> {
        let child_id = self.section_id(child).ok_or_else(|| {
            SimError::InvalidTopology(format!("child section '{}' does not exist", child))
        })?;
        let parent_id = self.section_id(parent).ok_or_else(|| {
            SimError::InvalidTopology(format!("parent section '{}' does not exist", parent))
        })?;
        self.attach(child_id, parent_id, parent_position)
    }

    pub fn section_id(&self, name: &str) -> Option<SectionId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Check the tree has exactly one root and flatten it into segments.
    pub fn finalize(self) -> Result<Morphology> {
        let roots: Vec<usize> = self
            .sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.parent.is_none())
            .map(|(i, _)| i)
            .collect();

        let root = match roots.as_slice() {
            [] => {
                return Err(SimError::InvalidTopology(
                    "tree has no sections or no root".to_string(),
                ))
            }
            [only] => SectionId(*only as u32),
            many => {
                let names: Vec<&str> = many
                    .iter()
                    .map(|&i| self.sections[i].spec.name.as_str())
                    .collect();
                return Err(SimError::InvalidTopology(format!(
                    "tree is disconnected: {} unattached sections ({})",
                    many.len(),
                    names.join(", ")
                )));
            }
        };

        let mut sections: Vec<Section> = self
            .sections
            .into_iter()
            .enumerate()
            .map(|(i, pending)| Section {
                id: SectionId(i as u32),
                spec: pending.spec,
                parent: pending.parent,
                first_segment: usize::MAX,
                children: Vec::new(),
            })
            .collect();

        for i in 0..sections.len() {
            if let Some((parent, _)) = sections[i].parent {
                sections[parent.index()].children.push(SectionId(i as u32));
            }
        }

        // Depth-first, parents before children, siblings in creation order
        let mut segments: Vec<Segment> = Vec::new();
        let mut stack = vec![root];
        let mut visited = 0usize;
        while let Some(id) = stack.pop() {
            visited += 1;
            let first = segments.len();
            sections[id.index()].first_segment = first;

            let section = &sections[id.index()];
            let spec = &section.spec;
            for k in 0..spec.nseg {
                let mut segment = Segment::build(spec, id, k);
                if k > 0 {
                    let previous = &segments[first + k as usize - 1];
                    let r = segment.half_resistance(spec) + previous.half_resistance(spec);
                    segment.parent = Some(first + k as usize - 1);
                    segment.axial_conductance = 1.0 / r;
                } else if let Some((parent_id, position)) = section.parent {
                    let parent = &sections[parent_id.index()];
                    let parent_index = parent.segment_at(position);
                    let parent_segment = &segments[parent_index];
                    let offset = (position - parent_segment.x).abs() * parent.spec.length;
                    let r = segment.half_resistance(spec)
                        + parent.spec.axial_resistance(offset, parent_segment.diameter);
                    segment.parent = Some(parent_index);
                    segment.axial_conductance = 1.0 / r;
                }
                segments.push(segment);
            }

            for child in section.children.iter().rev() {
                stack.push(*child);
            }
        }

        if visited != sections.len() {
            return Err(SimError::InvalidTopology(format!(
                "only {} of {} sections are reachable from the root",
                visited,
                sections.len()
            )));
        }

        Ok(Morphology {
            sections,
            segments,
            root,
        })
    }
}

/// Finalized, immutable compartment tree
#[derive(Debug, Clone, PartialEq)]
pub struct Morphology {
    sections: Vec<Section>,
    segments: Vec<Segment>,
    root: SectionId,
}

impl Morphology {
    pub fn root(&self) -> SectionId {
        self.root
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.index())
    }

    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.spec.name == name)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Flattened segment index for `(section, x)`
    pub fn locate(&self, section: &str, x: f64) -> Result<usize> {
        let sec = self.section_by_name(section).ok_or_else(|| {
            SimError::InvalidReference(format!("section '{}' does not exist", section))
        })?;
        require_unit_interval(&format!("position on '{}'", section), x)?;
        Ok(sec.segment_at(x))
    }

    /// Total membrane area (µm²)
    pub fn total_area(&self) -> f64 {
        self.segments.iter().map(|s| s.area).sum()
    }
}
