/// Disjoint-set forest over graph nodes that remembers, for every component,
/// the extremum it was born from.
///
/// Elder rule: when two components merge, the one whose extremum came first
/// in the sweep keeps it.
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
    extremum: Vec<usize>,
}

/// Outcome of merging two distinct components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    /// Extremum of the surviving (older) component.
    pub survivor: usize,
    /// Extremum of the component that was absorbed.
    pub absorbed: usize,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
            extremum: (0..size).collect(),
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        // Iterative with path halving; recursion overflows on large rasters.
        let mut x = x;
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Extremum of the component containing `x`.
    pub fn extremum(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.extremum[root]
    }

    /// Merge the components of `x` and `y`.
    ///
    /// `sweep_position[node]` is the node's position in the filtration; the
    /// lower position is the elder. Returns `None` if already connected.
    pub fn union(&mut self, x: usize, y: usize, sweep_position: &[usize]) -> Option<Merge> {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return None;
        }

        let (ext_x, ext_y) = (self.extremum[root_x], self.extremum[root_y]);
        let (survivor, absorbed) = if sweep_position[ext_x] <= sweep_position[ext_y] {
            (ext_x, ext_y)
        } else {
            (ext_y, ext_x)
        };

        // Always merge smaller rank into larger rank
        let (parent_root, child_root) = if self.rank[root_x] >= self.rank[root_y] {
            (root_x, root_y)
        } else {
            (root_y, root_x)
        };
        if self.rank[root_x] == self.rank[root_y] {
            self.rank[parent_root] += 1;
        }

        self.parent[child_root] = parent_root;
        self.extremum[parent_root] = survivor;

        Some(Merge { survivor, absorbed })
    }
}
