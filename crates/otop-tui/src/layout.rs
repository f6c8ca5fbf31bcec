//! Tiling layout tree.
//!
//! A workflow's pane arrangement is a tree of splits and leaves. Leaves
//! carry the [`PanelId`] of the panel they display; splits carry a
//! direction, an ordered child list, and a parallel list of proportions
//! (each at least 1). The renderable form is recomputed from scratch every
//! frame by [`LayoutNode::split_areas`]; with a handful of panes the cost
//! is noise, and it keeps mutation logic free of any diffing concerns.

use ratatui::layout::{Constraint, Layout, Rect};

use crate::panel::PanelId;

// ─── Direction ──────────────────────────────────────────────────────────────

/// How a split arranges its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Children side by side.
    Horizontal,
    /// Children stacked.
    Vertical,
}

impl Direction {
    pub(crate) const fn to_ratatui(self) -> ratatui::layout::Direction {
        match self {
            Self::Horizontal => ratatui::layout::Direction::Horizontal,
            Self::Vertical => ratatui::layout::Direction::Vertical,
        }
    }
}

/// Apply a signed delta to a proportion, clamping to the minimum of 1.
fn clamped(proportion: u16, delta: i32) -> u16 {
    u16::try_from((i32::from(proportion) + delta).max(1)).unwrap_or(u16::MAX)
}

// ─── Node ───────────────────────────────────────────────────────────────────

/// A tree element: either a terminal pane or a split of further nodes.
///
/// Invariants (held after every public operation):
/// * a split's `children` and `proportions` have equal length,
/// * every proportion is >= 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutNode {
    /// A terminal pane.
    Leaf {
        /// The panel rendered in this pane.
        panel: PanelId,
        /// The panel's registered type name, kept for debugging output.
        name: String,
    },
    /// An internal split.
    Split {
        /// Arrangement axis.
        direction: Direction,
        /// Child nodes in display order.
        children: Vec<LayoutNode>,
        /// Relative sizes, parallel with `children`.
        proportions: Vec<u16>,
    },
}

impl LayoutNode {
    /// An empty horizontal split, the initial root of every workflow.
    #[must_use]
    pub const fn empty_root() -> Self {
        Self::Split {
            direction: Direction::Horizontal,
            children: Vec::new(),
            proportions: Vec::new(),
        }
    }

    /// A leaf for the given panel.
    pub fn leaf(panel: PanelId, name: impl Into<String>) -> Self {
        Self::Leaf {
            panel,
            name: name.into(),
        }
    }

    /// An empty split along `direction`.
    #[must_use]
    pub const fn split(direction: Direction) -> Self {
        Self::Split {
            direction,
            children: Vec::new(),
            proportions: Vec::new(),
        }
    }

    /// Whether this node is a terminal pane.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// The panel of a leaf, `None` for splits.
    #[must_use]
    pub fn panel(&self) -> Option<PanelId> {
        match self {
            Self::Leaf { panel, .. } => Some(*panel),
            Self::Split { .. } => None,
        }
    }

    /// Number of direct children (0 for leaves).
    #[must_use]
    pub fn child_count(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Split { children, .. } => children.len(),
        }
    }

    /// Append a child with the given proportion (clamped to >= 1).
    /// No-op on leaves.
    pub fn add_child(&mut self, child: LayoutNode, proportion: u16) {
        let Self::Split {
            children,
            proportions,
            ..
        } = self
        else {
            return;
        };
        children.push(child);
        proportions.push(proportion.max(1));
    }

    /// Remove the first leaf in this subtree displaying `target`, deleting
    /// its proportion entry in lockstep. Returns whether a leaf was removed.
    pub fn remove_child(&mut self, target: PanelId) -> bool {
        let Self::Split {
            children,
            proportions,
            ..
        } = self
        else {
            return false;
        };
        for i in 0..children.len() {
            if children[i].panel() == Some(target) {
                children.remove(i);
                proportions.remove(i);
                return true;
            }
            if children[i].remove_child(target) {
                return true;
            }
        }
        false
    }

    /// Adjust the proportion of child `idx` by `delta`, clamping to 1.
    /// Out-of-range indices are ignored.
    pub fn resize_child(&mut self, idx: usize, delta: i32) {
        let Self::Split { proportions, .. } = self else {
            return;
        };
        let Some(p) = proportions.get_mut(idx) else {
            return;
        };
        *p = clamped(*p, delta);
    }

    /// Post-order normalization: drop empty splits and unwrap splits with a
    /// single child. The root itself may legitimately end up empty; an empty
    /// root renders as the placeholder pane.
    pub fn collapse(&mut self) {
        let Self::Split {
            children,
            proportions,
            ..
        } = self
        else {
            return;
        };
        let mut i = children.len();
        while i > 0 {
            i -= 1;
            if children[i].is_leaf() {
                continue;
            }
            children[i].collapse();
            match children[i].child_count() {
                0 => {
                    children.remove(i);
                    proportions.remove(i);
                }
                1 => {
                    let only = match &mut children[i] {
                        Self::Split {
                            children: inner, ..
                        } => inner.pop(),
                        Self::Leaf { .. } => None,
                    };
                    if let Some(only) = only {
                        children[i] = only;
                    }
                }
                _ => {}
            }
        }
    }

    /// All leaf panels in depth-first, left-to-right order. This sequence
    /// drives Tab / Shift-Tab focus cycling.
    #[must_use]
    pub fn focus_order(&self) -> Vec<PanelId> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<PanelId>) {
        match self {
            Self::Leaf { panel, .. } => out.push(*panel),
            Self::Split { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// The split directly containing the leaf for `target`, plus the
    /// child index of that leaf.
    #[must_use]
    pub fn find_parent(&self, target: PanelId) -> Option<(&LayoutNode, usize)> {
        let Self::Split { children, .. } = self else {
            return None;
        };
        for (i, child) in children.iter().enumerate() {
            if child.panel() == Some(target) {
                return Some((self, i));
            }
            if let Some(hit) = child.find_parent(target) {
                return Some(hit);
            }
        }
        None
    }

    /// Insert `new_leaf` adjacent to the leaf displaying `target`.
    ///
    /// When the containing split already runs along `dir`, the new leaf is
    /// inserted immediately after the target with proportion 1. Otherwise
    /// the target leaf is replaced in place by a new split along `dir`
    /// holding `[target, new_leaf]` with proportions `[1, 1]`.
    ///
    /// Returns whether `target` was found; the caller falls back to a root
    /// append when it was not.
    pub fn insert_near_target(
        &mut self,
        target: PanelId,
        new_leaf: &LayoutNode,
        dir: Direction,
    ) -> bool {
        let Self::Split {
            direction,
            children,
            proportions,
        } = self
        else {
            return false;
        };
        for i in 0..children.len() {
            if children[i].panel() == Some(target) {
                if *direction == dir {
                    children.insert(i + 1, new_leaf.clone());
                    proportions.insert(i + 1, 1);
                } else {
                    let old = std::mem::replace(&mut children[i], LayoutNode::split(dir));
                    children[i].add_child(old, 1);
                    children[i].add_child(new_leaf.clone(), 1);
                }
                return true;
            }
            if children[i].insert_near_target(target, new_leaf, dir) {
                return true;
            }
        }
        false
    }

    /// Resize the leaf displaying `target` by `delta` along `dir`.
    ///
    /// Only applies when the leaf's containing split runs along `dir`;
    /// a mismatched axis is a deliberate no-op (the delta has no meaning
    /// in the other axis). Returns whether the leaf was found.
    pub fn resize_leaf(&mut self, target: PanelId, dir: Direction, delta: i32) -> bool {
        let Self::Split {
            direction,
            children,
            proportions,
        } = self
        else {
            return false;
        };
        for i in 0..children.len() {
            if children[i].panel() == Some(target) {
                if *direction == dir
                    && let Some(p) = proportions.get_mut(i)
                {
                    *p = clamped(*p, delta);
                }
                return true;
            }
            if children[i].resize_leaf(target, dir, delta) {
                return true;
            }
        }
        false
    }

    /// Compute the screen rectangle of every leaf, depth-first.
    ///
    /// Proportions map to [`Constraint::Fill`] weights, so siblings share
    /// their split's extent in proportion. Empty splits produce nothing.
    #[must_use]
    pub fn split_areas(&self, area: Rect) -> Vec<(PanelId, Rect)> {
        let mut out = Vec::new();
        self.collect_areas(area, &mut out);
        out
    }

    fn collect_areas(&self, area: Rect, out: &mut Vec<(PanelId, Rect)>) {
        match self {
            Self::Leaf { panel, .. } => out.push((*panel, area)),
            Self::Split {
                direction,
                children,
                proportions,
            } => {
                if children.is_empty() {
                    return;
                }
                let constraints: Vec<Constraint> =
                    proportions.iter().map(|p| Constraint::Fill(*p)).collect();
                let chunks = Layout::default()
                    .direction(direction.to_ratatui())
                    .constraints(constraints)
                    .split(area);
                for (child, chunk) in children.iter().zip(chunks.iter()) {
                    child.collect_areas(*chunk, out);
                }
            }
        }
    }
}
