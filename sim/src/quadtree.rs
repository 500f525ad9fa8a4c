//! Point quadtree used for radius queries.
//!
//! Nodes subdivide lazily on the `capacity + 1`-th insert and stop
//! subdividing at `MAX_DEPTH`, where they accept any number of items.

use crate::geometry::{Aabb, Quadrant};

/// Default number of items a leaf holds before it subdivides.
pub const DEFAULT_CAPACITY: usize = 16;

/// Depth at which nodes stop subdividing.
pub const MAX_DEPTH: u32 = 6;

/// Anything that can be stored in a quadtree.
pub trait QuadtreeItem: Copy {
    /// Identifier used to exclude the querying entity from its own results.
    fn id(&self) -> u32;
    /// World-space center, precomputed at insert time.
    fn center(&self) -> (f32, f32);
}

/// The four children of a divided node.
#[derive(Debug)]
pub struct Children<T> {
    pub northeast: QuadtreeNode<T>,
    pub northwest: QuadtreeNode<T>,
    pub southeast: QuadtreeNode<T>,
    pub southwest: QuadtreeNode<T>,
}

impl<T> Children<T> {
    fn get_mut(&mut self, quadrant: Quadrant) -> &mut QuadtreeNode<T> {
        match quadrant {
            Quadrant::NorthEast => &mut self.northeast,
            Quadrant::NorthWest => &mut self.northwest,
            Quadrant::SouthEast => &mut self.southeast,
            Quadrant::SouthWest => &mut self.southwest,
        }
    }

    fn iter(&self) -> [&QuadtreeNode<T>; 4] {
        [&self.northeast, &self.northwest, &self.southeast, &self.southwest]
    }
}

/// A quadtree node. Either a leaf holding items, or divided with all of its
/// items pushed into exactly one child each.
#[derive(Debug)]
pub struct QuadtreeNode<T> {
    boundary: Aabb,
    capacity: usize,
    depth: u32,
    items: Vec<T>,
    children: Option<Box<Children<T>>>,
}

impl<T: QuadtreeItem> QuadtreeNode<T> {
    /// Create a root node.
    pub fn new(boundary: Aabb, capacity: usize) -> Self {
        Self::with_depth(boundary, capacity, 0)
    }

    /// Create a node at a given depth.
    pub fn with_depth(boundary: Aabb, capacity: usize, depth: u32) -> Self {
        Self {
            boundary,
            capacity,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    pub fn boundary(&self) -> &Aabb {
        &self.boundary
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }

    /// Items held directly by this node (always empty once divided).
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn children(&self) -> Option<&Children<T>> {
        self.children.as_deref()
    }

    /// Total items in this subtree.
    pub fn len(&self) -> usize {
        match &self.children {
            Some(children) => children.iter().iter().map(|c| c.len()).sum(),
            None => self.items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert an item. Returns `false` without touching the tree when the
    /// item's center lies outside this node's boundary.
    pub fn insert(&mut self, item: T) -> bool {
        let (cx, cy) = item.center();
        if !self.boundary.contains_point(cx, cy) {
            return false;
        }
        self.insert_contained(item);
        true
    }

    /// Insert an item already known to lie inside `boundary`.
    fn insert_contained(&mut self, item: T) {
        if let Some(children) = self.children.as_mut() {
            let (cx, cy) = item.center();
            children
                .get_mut(self.boundary.quadrant_of(cx, cy))
                .insert_contained(item);
            return;
        }

        if self.items.len() < self.capacity || self.depth >= MAX_DEPTH {
            self.items.push(item);
            return;
        }

        self.subdivide();
        self.insert_contained(item);
    }

    fn subdivide(&mut self) {
        let depth = self.depth + 1;
        let node = |q: Quadrant| QuadtreeNode::with_depth(self.boundary.quadrant(q), self.capacity, depth);
        let mut children = Box::new(Children {
            northeast: node(Quadrant::NorthEast),
            northwest: node(Quadrant::NorthWest),
            southeast: node(Quadrant::SouthEast),
            southwest: node(Quadrant::SouthWest),
        });

        for item in self.items.drain(..) {
            let (cx, cy) = item.center();
            children
                .get_mut(self.boundary.quadrant_of(cx, cy))
                .insert_contained(item);
        }
        self.children = Some(children);
    }

    /// Append every item within the circle to `out`.
    ///
    /// Items exactly on the circle are included. The item whose id equals
    /// `exclude_id` is skipped. Subtrees whose boundary misses the circle
    /// are not visited.
    pub fn query_circle_into(
        &self,
        cx: f32,
        cy: f32,
        radius_sq: f32,
        exclude_id: Option<u32>,
        out: &mut Vec<T>,
    ) {
        if !self.boundary.intersects_circle(cx, cy, radius_sq) {
            return;
        }

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_circle_into(cx, cy, radius_sq, exclude_id, out);
            }
            return;
        }

        for item in &self.items {
            if exclude_id == Some(item.id()) {
                continue;
            }
            let (ix, iy) = item.center();
            let dx = ix - cx;
            let dy = iy - cy;
            if dx * dx + dy * dy <= radius_sq {
                out.push(*item);
            }
        }
    }

    /// Drop every item and child, leaving an undivided empty leaf.
    pub fn clear(&mut self) {
        self.items.clear();
        self.children = None;
    }
}
