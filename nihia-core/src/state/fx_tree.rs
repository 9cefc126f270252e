//! The FX container tree of one track, flattened into an arena.
//!
//! The hardware addresses a plugin by its top-level slot plus a path of
//! 0-based child positions; the host addresses it by an opaque handle whose
//! child numbering is not contiguous in the general case. This tree is the
//! translation between the two. It is rebuilt from live host queries on
//! every FX-list-changed notification and before every traversal — a path
//! computed earlier may point at an FX that no longer exists, and every
//! resolution here treats that as "not found", never as an error.

use crate::daw::{DawDriver, FxHandle};

#[derive(Debug, Clone)]
pub struct FxNode {
    pub handle: FxHandle,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct FxTree {
    nodes: Vec<FxNode>,
    roots: Vec<usize>,
}

impl FxTree {
    /// Rebuild from the live container structure of `track`.
    pub fn build(daw: &dyn DawDriver, track: usize) -> FxTree {
        let mut tree = FxTree::default();
        for slot in 0..daw.fx_count(track) {
            let idx = tree.push(slot as FxHandle, None);
            tree.roots.push(idx);
            tree.build_children(daw, track, idx);
        }
        tree
    }

    fn push(&mut self, handle: FxHandle, parent: Option<usize>) -> usize {
        self.nodes.push(FxNode {
            handle,
            parent,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn build_children(&mut self, daw: &dyn DawDriver, track: usize, parent: usize) {
        let parent_handle = self.nodes[parent].handle;
        if !daw.fx_is_container(track, parent_handle) {
            return;
        }
        for pos in 0..daw.fx_child_count(track, parent_handle) {
            let Some(handle) = daw.fx_child(track, parent_handle, pos) else {
                // List shrank while we walked it.
                break;
            };
            let idx = self.push(handle, Some(parent));
            self.nodes[parent].children.push(idx);
            self.build_children(daw, track, idx);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node(&self, idx: usize) -> Option<&FxNode> {
        self.nodes.get(idx)
    }

    pub fn handle_of(&self, idx: usize) -> Option<FxHandle> {
        self.nodes.get(idx).map(|n| n.handle)
    }

    pub fn find_handle(&self, handle: FxHandle) -> Option<usize> {
        self.nodes.iter().position(|n| n.handle == handle)
    }

    pub fn first_root(&self) -> Option<usize> {
        self.roots.first().copied()
    }

    /// Hardware path of a node: top-level slot first, then one 0-based child
    /// position per nesting level.
    pub fn path_of(&self, idx: usize) -> Option<Vec<u8>> {
        let mut path = Vec::new();
        let mut cursor = idx;
        loop {
            let node = self.nodes.get(cursor)?;
            match node.parent {
                Some(parent) => {
                    let pos = self.nodes[parent].children.iter().position(|&c| c == cursor)?;
                    path.push(pos as u8);
                    cursor = parent;
                }
                None => {
                    let slot = self.roots.iter().position(|&r| r == cursor)?;
                    path.push(slot as u8);
                    break;
                }
            }
        }
        path.reverse();
        Some(path)
    }

    /// Resolve a hardware path top-down. Any missing step means the FX was
    /// removed since the path was computed; the caller treats `None` as a
    /// no-op.
    pub fn node_at_path(&self, path: &[u8]) -> Option<usize> {
        let (&top, rest) = path.split_first()?;
        let mut cursor = *self.roots.get(usize::from(top))?;
        for &pos in rest {
            cursor = *self.nodes[cursor].children.get(usize::from(pos))?;
        }
        Some(cursor)
    }

    /// Position of a child handle inside a container, derived from the
    /// container's index stride (the delta between its first two children's
    /// handles). Falls back to a linear scan when the stride arithmetic
    /// does not land on the handle.
    pub fn child_position(&self, parent: usize, handle: FxHandle) -> Option<usize> {
        let children = &self.nodes.get(parent)?.children;
        let first = self.nodes[*children.first()?].handle;
        if children.len() >= 2 {
            let stride = self.nodes[children[1]].handle - first;
            if stride > 0 {
                let offset = handle - first;
                if offset >= 0 && offset % stride == 0 {
                    let pos = (offset / stride) as usize;
                    if children
                        .get(pos)
                        .is_some_and(|&c| self.nodes[c].handle == handle)
                    {
                        return Some(pos);
                    }
                }
            }
        }
        children
            .iter()
            .position(|&c| self.nodes[c].handle == handle)
    }

    fn sibling(&self, idx: usize, offset: i32) -> Option<usize> {
        let list = match self.nodes[idx].parent {
            Some(parent) => &self.nodes[parent].children,
            None => &self.roots,
        };
        let pos = list.iter().position(|&c| c == idx)?;
        let target = pos as i32 + offset;
        if target < 0 {
            None
        } else {
            list.get(target as usize).copied()
        }
    }

    fn deepest_last(&self, mut idx: usize) -> usize {
        while let Some(&last) = self.nodes[idx].children.last() {
            idx = last;
        }
        idx
    }

    /// Depth-first successor: first child, else next sibling, else the next
    /// sibling of the nearest ancestor that has one.
    pub fn next(&self, idx: usize) -> Option<usize> {
        if let Some(&first) = self.nodes.get(idx)?.children.first() {
            return Some(first);
        }
        let mut cursor = idx;
        loop {
            if let Some(sib) = self.sibling(cursor, 1) {
                return Some(sib);
            }
            cursor = self.nodes[cursor].parent?;
        }
    }

    /// Depth-first predecessor: previous sibling's deepest last descendant,
    /// else the parent.
    pub fn prev(&self, idx: usize) -> Option<usize> {
        self.nodes.get(idx)?;
        match self.sibling(idx, -1) {
            Some(sib) => Some(self.deepest_last(sib)),
            None => self.nodes[idx].parent,
        }
    }
}
