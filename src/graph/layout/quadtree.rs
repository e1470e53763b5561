use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Axis-aligned square cell, stored as its top-left corner and side length.
#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    min: Vec2,
    side: f32,
}

fn axis_gap(a_min: f32, b_min: f32, a_side: f32, b_side: f32) -> f32 {
    (b_min - (a_min + a_side)).max(a_min - (b_min + b_side)).max(0.0)
}

impl QuadBounds {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (low, high) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(low, high), point| (low.min(*point), high.max(*point)),
        );
        if !(low.x.is_finite() && low.y.is_finite() && high.x.is_finite() && high.y.is_finite()) {
            return None;
        }

        let side = (high - low).max_elem().max(1.0) + 2.0;
        let middle = (low + high) * 0.5;
        Some(Self {
            min: middle - Vec2::splat(side * 0.5),
            side,
        })
    }

    fn middle(self) -> Vec2 {
        self.min + Vec2::splat(self.side * 0.5)
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = point - self.min;
        (0.0..=self.side).contains(&offset.x) && (0.0..=self.side).contains(&offset.y)
    }

    /// Quadrants are numbered left-to-right, then top-to-bottom.
    fn child(self, quadrant: usize) -> Self {
        let half = self.side * 0.5;
        let step = vec2((quadrant & 1) as f32, (quadrant >> 1) as f32);
        Self {
            min: self.min + step * half,
            side: half,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        let middle = self.middle();
        usize::from(point.x >= middle.x) | (usize::from(point.y >= middle.y) << 1)
    }

    pub(super) fn side_length(self) -> f32 {
        self.side
    }

    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let dx = axis_gap(self.min.x, other.min.x, self.side, other.side);
        let dy = axis_gap(self.min.y, other.min.y, self.side, other.side);
        dx * dx + dy * dy
    }
}

pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    /// Largest collision radius of any point in this cell.
    pub(super) max_radius: f32,
    /// Point indices; empty for inner cells.
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2], radii: &[f32]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(positions)?;
        Some(Self::subdivide(bounds, (0..positions.len()).collect(), positions, radii, 0))
    }

    fn subdivide(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        radii: &[f32],
        depth: usize,
    ) -> Self {
        let mass = indices.len() as f32;
        let sum = indices
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index]);
        let max_radius = indices
            .iter()
            .filter_map(|&index| radii.get(index).copied())
            .fold(0.0_f32, f32::max);

        let mut node = Self {
            bounds,
            center_of_mass: if mass > 0.0 { sum / mass } else { Vec2::ZERO },
            mass,
            max_radius,
            indices,
            children: Default::default(),
        };
        if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &node.indices {
            buckets[bounds.quadrant_for(positions[index])].push(index);
        }
        // Coincident points would split forever; keep them in one leaf.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() < 2 {
            return node;
        }

        node.indices = Vec::new();
        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                node.children[quadrant] = Some(Box::new(Self::subdivide(
                    bounds.child(quadrant),
                    bucket,
                    positions,
                    radii,
                    depth + 1,
                )));
            }
        }
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}
