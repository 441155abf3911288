//! Array-backed disjoint set over provisional labels.

use crate::raster::Label;

/// Union by rank with path compression. Index 0 is reserved for the
/// background and never joins a set. The representative of every set is
/// its smallest member, so canonical labels follow raster order.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<Label>,
    rank: Vec<u8>,
    // smallest member of the set rooted at each index
    min: Vec<Label>,
}

impl Default for UnionFind {
    fn default() -> Self {
        Self::new()
    }
}

impl UnionFind {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut uf = Self {
            parent: Vec::with_capacity(capacity + 1),
            rank: Vec::with_capacity(capacity + 1),
            min: Vec::with_capacity(capacity + 1),
        };
        uf.parent.push(0);
        uf.rank.push(0);
        uf.min.push(0);
        uf
    }

    /// Number of labels created so far (background excluded).
    pub fn len(&self) -> usize {
        self.parent.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocates the next provisional label as a singleton set.
    pub fn make_set(&mut self) -> Label {
        let label = self.parent.len() as Label;
        self.parent.push(label);
        self.rank.push(0);
        self.min.push(label);
        label
    }

    /// Root of the tree containing `label`, compressing the path on the way.
    pub fn find(&mut self, label: Label) -> Label {
        let mut root = label;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut cur = label;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    /// Smallest label of the set containing `label`.
    pub fn canonical(&mut self, label: Label) -> Label {
        let root = self.find(label);
        self.min[root as usize]
    }

    /// Merges the sets of `a` and `b`; returns the new root.
    pub fn union(&mut self, a: Label, b: Label) -> Label {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return ra;
        }
        let (root, child) = match self.rank[ra as usize].cmp(&self.rank[rb as usize]) {
            std::cmp::Ordering::Less => (rb, ra),
            std::cmp::Ordering::Greater => (ra, rb),
            std::cmp::Ordering::Equal => {
                self.rank[ra as usize] += 1;
                (ra, rb)
            }
        };
        self.parent[child as usize] = root;
        self.min[root as usize] = self.min[root as usize].min(self.min[child as usize]);
        root
    }

    pub fn same_set(&mut self, a: Label, b: Label) -> bool {
        self.find(a) == self.find(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons() {
        let mut uf = UnionFind::new();
        let a = uf.make_set();
        let b = uf.make_set();
        assert_eq!((a, b), (1, 2));
        assert_eq!(uf.len(), 2);
        assert!(!uf.same_set(a, b));
        assert_eq!(uf.canonical(b), b);
    }

    #[test]
    fn test_canonical_is_smallest_member() {
        let mut uf = UnionFind::new();
        let labels: Vec<Label> = (0..6).map(|_| uf.make_set()).collect();
        uf.union(labels[5], labels[4]);
        uf.union(labels[4], labels[2]);
        uf.union(labels[3], labels[5]);
        for &l in &[labels[2], labels[3], labels[4], labels[5]] {
            assert_eq!(uf.canonical(l), labels[2]);
        }
        assert_eq!(uf.canonical(labels[0]), labels[0]);
        assert!(!uf.same_set(labels[0], labels[1]));
    }

    #[test]
    fn test_union_is_idempotent() {
        let mut uf = UnionFind::new();
        let a = uf.make_set();
        let b = uf.make_set();
        let r1 = uf.union(a, b);
        let r2 = uf.union(b, a);
        assert_eq!(r1, r2);
        assert!(uf.same_set(a, b));
    }
}
