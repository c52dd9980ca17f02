//! Individually addressable contact cuts.

use geometry::prelude::*;
use indexmap::IndexMap;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use crate::tech::LayerId;

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CutId(u32);

/// A cut polygon, in internal units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cut {
    pub id: CutId,
    pub layer: LayerId,
    pub rect: Rect,
}

type Element<T> = GeomWithData<Rectangle<[i64; 2]>, T>;

fn envelope(r: Rect) -> AABB<[i64; 2]> {
    AABB::from_corners([r.left(), r.bot()], [r.right(), r.top()])
}

fn element<T>(r: Rect, data: T) -> Element<T> {
    GeomWithData::new(
        Rectangle::from_corners([r.left(), r.bot()], [r.right(), r.top()]),
        data,
    )
}

/// A spatial index of rectangles tagged with `T`.
///
/// Query results are sorted so that iteration order never depends on tree layout.
#[derive(Debug, Clone)]
pub struct RectIndex<T: Copy + Ord> {
    tree: RTree<Element<T>>,
}

impl<T: Copy + Ord> Default for RectIndex<T> {
    fn default() -> Self {
        Self { tree: RTree::new() }
    }
}

impl<T: Copy + Ord> RectIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rect: Rect, data: T) {
        self.tree.insert(element(rect, data));
    }

    /// Removes the entry for `data` with bounding box `rect`.
    pub fn remove(&mut self, rect: Rect, data: T) -> bool {
        self.tree.remove(&element(rect, data)).is_some()
    }

    /// Entries whose boxes intersect or touch `rect`.
    pub fn query(&self, rect: Rect) -> Vec<T> {
        let mut out: Vec<T> = self
            .tree
            .locate_in_envelope_intersecting(&envelope(rect))
            .map(|e| e.data)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// The pending cuts of one cut layer.
#[derive(Debug, Clone)]
pub struct CutIndex {
    layer: LayerId,
    next: u32,
    cuts: IndexMap<CutId, Cut>,
    index: RectIndex<CutId>,
}

impl CutIndex {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            next: 0,
            cuts: IndexMap::new(),
            index: RectIndex::new(),
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn insert(&mut self, rect: Rect) -> CutId {
        let id = CutId(self.next);
        self.next += 1;
        self.index.insert(rect, id);
        self.cuts.insert(
            id,
            Cut {
                id,
                layer: self.layer,
                rect,
            },
        );
        id
    }

    pub fn get(&self, id: CutId) -> Option<&Cut> {
        self.cuts.get(&id)
    }

    /// Removes a cut, returning it if it was still pending.
    pub fn remove(&mut self, id: CutId) -> Option<Cut> {
        let cut = self.cuts.shift_remove(&id)?;
        self.index.remove(cut.rect, id);
        Some(cut)
    }

    /// Pending cuts intersecting or touching `rect`.
    pub fn query(&self, rect: Rect) -> Vec<&Cut> {
        self.index
            .query(rect)
            .into_iter()
            .filter_map(|id| self.cuts.get(&id))
            .collect()
    }

    /// The pending cut exactly covering `rect`, if any.
    pub fn exact(&self, rect: Rect) -> Option<&Cut> {
        self.query(rect).into_iter().find(|c| c.rect == rect)
    }

    /// Pending cuts in insertion order.
    pub fn pending(&self) -> impl Iterator<Item = &Cut> {
        self.cuts.values()
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_and_remove_cuts() {
        let mut index = CutIndex::new(LayerId(11));
        let a = index.insert(Rect::from_sides(0, 0, 20, 20));
        let b = index.insert(Rect::from_sides(40, 0, 60, 20));
        let c = index.insert(Rect::from_sides(400, 0, 420, 20));

        let near: Vec<_> = index
            .query(Rect::from_sides(10, 10, 45, 15))
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(near, vec![a, b]);

        assert_eq!(index.exact(Rect::from_sides(40, 0, 60, 20)).map(|c| c.id), Some(b));
        assert!(index.exact(Rect::from_sides(40, 0, 61, 20)).is_none());

        assert!(index.remove(b).is_some());
        assert!(index.remove(b).is_none());
        assert_eq!(index.query(Rect::from_sides(0, 0, 500, 20)).len(), 2);
        assert_eq!(index.pending().map(|c| c.id).collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn touching_boxes_are_returned() {
        let mut index = RectIndex::new();
        index.insert(Rect::from_sides(0, 0, 10, 10), 1u32);
        assert_eq!(index.query(Rect::from_sides(10, 10, 20, 20)), vec![1]);
        assert!(index.remove(Rect::from_sides(0, 0, 10, 10), 1));
        assert!(index.is_empty());
    }
}
