//! A static K-D tree over points in the positive orthant.
//!
//! Each tree node stores the componentwise maximum ("upper corner") of all
//! points in its subtree, which lets a `Visitor` skip subtrees that cannot
//! matter to it.

struct KdNode {
    item: usize,
    left: Option<usize>,
    right: Option<usize>,
    upper: Vec<f64>,
}

pub struct KdTree {
    nodes: Vec<KdNode>,
    root: Option<usize>,
}

/// Drives a walk over the tree.
pub trait Visitor {
    /// Whether a subtree whose points are all componentwise `<= upper` can
    /// contain anything of interest. Returning `false` skips it.
    fn may_contain(&self, upper: &[f64]) -> bool;

    /// Called with the index of a point. Returning `false` ends the walk.
    fn visit(&mut self, item: usize) -> bool;
}

impl KdTree {
    /// Builds the tree. The split axis cycles through the dimensions by depth,
    /// each node pivots on the median along its axis.

    pub fn build<P>(points: &[P]) -> KdTree
        where P: AsRef<[f64]>
    {
        let mut tree = KdTree {
            nodes: Vec::with_capacity(points.len()),
            root: None,
        };
        let mut indices: Vec<usize> = (0..points.len()).collect();
        tree.root = tree.build_subtree(points, &mut indices, 0);
        tree
    }

    fn build_subtree<P>(&mut self, points: &[P], indices: &mut [usize], depth: usize) -> Option<usize>
        where P: AsRef<[f64]>
    {
        if indices.is_empty() {
            return None;
        }

        let dims = points[indices[0]].as_ref().len();
        if dims > 0 {
            let axis = depth % dims;
            indices.sort_by(|&a, &b| points[a].as_ref()[axis].total_cmp(&points[b].as_ref()[axis]));
        }

        let mid = indices.len() / 2;
        let item = indices[mid];
        let (below, rest) = indices.split_at_mut(mid);
        let above = &mut rest[1..];

        let left = self.build_subtree(points, below, depth + 1);
        let right = self.build_subtree(points, above, depth + 1);

        let mut upper = points[item].as_ref().to_vec();
        for child in left.iter().chain(right.iter()) {
            for (u, &c) in upper.iter_mut().zip(self.nodes[*child].upper.iter()) {
                if c > *u {
                    *u = c;
                }
            }
        }

        self.nodes.push(KdNode {
            item: item,
            left: left,
            right: right,
            upper: upper,
        });
        Some(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first walk, pruned by `Visitor::may_contain`.

    pub fn walk<V>(&self, visitor: &mut V)
        where V: Visitor
    {
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if !visitor.may_contain(&node.upper) {
                continue;
            }
            if !visitor.visit(node.item) {
                return;
            }
            if let Some(r) = node.right {
                stack.push(r);
            }
            if let Some(l) = node.left {
                stack.push(l);
            }
        }
    }
}

#[cfg(test)]
struct AtLeast {
    corner: Vec<f64>,
    found: Vec<usize>,
    visited: usize,
}

#[cfg(test)]
impl Visitor for AtLeast {
    fn may_contain(&self, upper: &[f64]) -> bool {
        upper.iter().zip(self.corner.iter()).all(|(u, c)| u >= c)
    }

    fn visit(&mut self, item: usize) -> bool {
        self.visited += 1;
        self.found.push(item);
        true
    }
}

#[test]
fn test_walk_visits_everything_when_unpruned() {
    let points: Vec<Vec<f64>> = (0..37).map(|i| vec![(i * 7 % 37) as f64, (i * 11 % 37) as f64]).collect();
    let tree = KdTree::build(&points);
    assert_eq!(37, tree.len());
    let mut v = AtLeast {
        corner: vec![0.0, 0.0],
        found: Vec::new(),
        visited: 0,
    };
    tree.walk(&mut v);
    v.found.sort();
    assert_eq!((0..37).collect::<Vec<_>>(), v.found);
}

#[test]
fn test_pruning_is_conservative() {
    let points: Vec<Vec<f64>> = (0..100)
        .map(|i| {
            let x = ((i * 37) % 101) as f64 / 10.0;
            let y = ((i * 53) % 103) as f64 / 10.0;
            let z = ((i * 17) % 97) as f64 / 10.0;
            vec![x, y, z]
        })
        .collect();
    let tree = KdTree::build(&points);
    let corner = vec![6.0, 6.0, 6.0];

    let mut v = AtLeast {
        corner: corner.clone(),
        found: Vec::new(),
        visited: 0,
    };
    tree.walk(&mut v);

    let mut expected: Vec<usize> = points
        .iter()
        .enumerate()
        .filter(|&(_, p)| p.iter().zip(corner.iter()).all(|(a, c)| a >= c))
        .map(|(i, _)| i)
        .collect();
    let mut hits: Vec<usize> = v
        .found
        .iter()
        .cloned()
        .filter(|&i| points[i].iter().zip(corner.iter()).all(|(a, c)| a >= c))
        .collect();
    expected.sort();
    hits.sort();
    assert_eq!(expected, hits);
    assert!(v.visited < points.len());
}

#[test]
fn test_empty_tree() {
    let points: Vec<Vec<f64>> = Vec::new();
    let tree = KdTree::build(&points);
    assert!(tree.is_empty());
    let mut v = AtLeast {
        corner: vec![],
        found: Vec::new(),
        visited: 0,
    };
    tree.walk(&mut v);
    assert_eq!(0, v.visited);
}
