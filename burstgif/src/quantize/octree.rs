// octree.rs
//
// Copyright (c) 2025  Douglas Lau
//
use super::{Color, ColorSum, histogram};
use std::collections::VecDeque;

/// Depth of the color tree
const DEPTH: usize = 8;

/// Octree quantizer.
///
/// Colors are inserted into a tree branching on one bit of each channel per
/// level.  Whenever there are too many leaves, the most recently created
/// node on the deepest level is merged into a single leaf.  The palette
/// lists leaves level by level, so merged colors come first.
#[derive(Debug, Default)]
pub struct Octree {
    pub(crate) colors: Vec<Color>,
}

/// Tree node
#[derive(Clone, Debug, Default)]
struct Node {
    /// Child node indices
    children: [Option<usize>; 8],
    /// Sum of colors (leaf nodes only)
    sum: ColorSum,
    /// Leaf flag
    leaf: bool,
}

/// Color tree, with nodes stored in an arena
#[derive(Debug)]
struct Tree {
    /// All nodes (root is first)
    nodes: Vec<Node>,
    /// Internal nodes on each level, in creation order
    reducible: [Vec<usize>; DEPTH],
    /// Number of leaf nodes
    n_leaves: usize,
}

/// Get the child index of a color on one level
fn child_index(clr: Color, level: usize) -> usize {
    let shift = 7 - level;
    let r = usize::from(clr[0] >> shift) & 1;
    let g = usize::from(clr[1] >> shift) & 1;
    let b = usize::from(clr[2] >> shift) & 1;
    (r << 2) | (g << 1) | b
}

impl Tree {
    fn new() -> Self {
        let mut reducible: [Vec<usize>; DEPTH] = Default::default();
        reducible[0].push(0);
        Tree {
            nodes: vec![Node::default()],
            reducible,
            n_leaves: 0,
        }
    }

    /// Insert a color with a pixel count
    fn insert(&mut self, clr: Color, count: u32) {
        let mut node = 0;
        for level in 0..DEPTH {
            if self.nodes[node].leaf {
                break;
            }
            let i = child_index(clr, level);
            node = match self.nodes[node].children[i] {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    let leaf = level + 1 == DEPTH;
                    self.nodes.push(Node {
                        leaf,
                        ..Default::default()
                    });
                    if leaf {
                        self.n_leaves += 1;
                    } else {
                        self.reducible[level + 1].push(child);
                    }
                    self.nodes[node].children[i] = Some(child);
                    child
                }
            };
        }
        self.nodes[node].sum.add(clr, count);
    }

    /// Merge the children of the deepest reducible node
    fn reduce(&mut self) {
        let Some(node) = self.reducible.iter_mut().rev().find_map(Vec::pop)
        else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[node].children);
        let mut sum = ColorSum::default();
        let mut merged = 0;
        for child in children.into_iter().flatten() {
            sum.merge(&self.nodes[child].sum);
            merged += 1;
        }
        let n = &mut self.nodes[node];
        n.sum = sum;
        n.leaf = true;
        self.n_leaves = self.n_leaves + 1 - merged;
    }

    /// Collect leaf colors in level order, shallowest first
    fn leaf_colors(&self) -> Vec<Color> {
        let mut colors = Vec::with_capacity(self.n_leaves);
        let mut queue = VecDeque::from([0]);
        while let Some(node) = queue.pop_front() {
            let n = &self.nodes[node];
            if n.leaf {
                colors.extend(n.sum.mean());
            } else {
                queue.extend(n.children.iter().flatten());
            }
        }
        colors
    }
}

impl Octree {
    pub(crate) fn quantize(&mut self, colors: &[Color], max_colors: usize) -> &[Color] {
        let mut tree = Tree::new();
        for (clr, count) in histogram(colors) {
            tree.insert(clr, count);
            while tree.n_leaves > max_colors {
                tree.reduce();
            }
        }
        self.colors = tree.leaf_colors();
        &self.colors
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn children() {
        assert_eq!(child_index([0x80, 0, 0], 0), 4);
        assert_eq!(child_index([0, 0x80, 0x80], 0), 3);
        assert_eq!(child_index([0, 0, 1], 7), 1);
        assert_eq!(child_index([0, 0, 1], 6), 0);
    }

    #[test]
    fn exact_when_few() {
        let mut q = Octree::default();
        let colors = [[0, 0, 0], [255, 255, 255], [0, 0, 0], [128, 0, 64]];
        assert_eq!(
            q.quantize(&colors, 256),
            [[0, 0, 0], [128, 0, 64], [255, 255, 255]]
        );
    }

    #[test]
    fn merges_nearby() {
        let mut q = Octree::default();
        let colors = [[0, 0, 0], [1, 1, 1], [255, 255, 255]];
        assert_eq!(q.quantize(&colors, 2), [[1, 1, 1], [255, 255, 255]]);
    }

    #[test]
    fn merged_leaves_first() {
        let mut q = Octree::default();
        let colors = [[0, 0, 0], [0, 0, 1], [255, 255, 255], [255, 255, 254]];
        // the two light colors merge into one leaf on level 7
        assert_eq!(
            q.quantize(&colors, 3),
            [[255, 255, 255], [0, 0, 0], [0, 0, 1]]
        );
    }

    #[test]
    fn single_color() {
        let mut q = Octree::default();
        let colors = [[0, 0, 0], [100, 100, 100], [200, 200, 200]];
        assert_eq!(q.quantize(&colors, 1), [[100, 100, 100]]);
    }
}
