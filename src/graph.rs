//! 4-connected neighbor graph over an elevation grid.

use crate::ElevationGrid;

/// Undirected graph with one node per grid cell and an edge between every
/// pair of horizontally or vertically adjacent cells.
///
/// Node ids are the flattened cell indices `x + width * y`. Each node carries
/// the elevation of its cell as its value. Adjacency is implicit in the grid
/// layout, so the graph costs one value per node and nothing per edge.
#[derive(Debug, Clone)]
pub struct GridGraph {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl GridGraph {
    pub fn from_grid(grid: &ElevationGrid) -> Self {
        GridGraph {
            width: grid.width,
            height: grid.height,
            values: grid.values().to_vec(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn node_count(&self) -> usize {
        self.values.len()
    }

    /// `(w - 1) * h` horizontal plus `w * (h - 1)` vertical edges.
    pub fn edge_count(&self) -> usize {
        (self.width - 1) * self.height + self.width * (self.height - 1)
    }

    pub fn value(&self, node: usize) -> f64 {
        self.values[node]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Up, left, right and down neighbors that lie inside the grid.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> {
        let (x, y) = (node % self.width, node / self.width);
        [
            (y > 0).then(|| node - self.width),
            (x > 0).then(|| node - 1),
            (x + 1 < self.width).then(|| node + 1),
            (y + 1 < self.height).then(|| node + self.width),
        ]
        .into_iter()
        .flatten()
    }

    pub fn degree(&self, node: usize) -> usize {
        self.neighbors(node).count()
    }

    /// Every edge once, as `(a, b)` with `a < b`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.node_count()).flat_map(move |a| {
            let (x, y) = (a % self.width, a / self.width);
            let right = (x + 1 < self.width).then(|| (a, a + 1));
            let below = (y + 1 < self.height).then(|| (a, a + self.width));
            right.into_iter().chain(below)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_graph(width: usize, height: usize) -> GridGraph {
        let grid = ElevationGrid::from_raw(width, height, vec![1.0; width * height]).unwrap();
        GridGraph::from_grid(&grid)
    }

    #[test]
    fn test_interior_and_border_degrees() {
        let graph = flat_graph(4, 3);
        for y in 0..3 {
            for x in 0..4 {
                let idx = x + 4 * y;
                let on_x_edge = x == 0 || x == 3;
                let on_y_edge = y == 0 || y == 2;
                let expected = match (on_x_edge, on_y_edge) {
                    (false, false) => 4,
                    (true, true) => 2,
                    _ => 3,
                };
                assert_eq!(graph.degree(idx), expected, "cell ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_edge_count() {
        let graph = flat_graph(5, 7);
        assert_eq!(graph.node_count(), 35);
        assert_eq!(graph.edge_count(), 4 * 7 + 5 * 6);
        assert_eq!(graph.edges().count(), graph.edge_count());
    }

    #[test]
    fn test_no_diagonals() {
        let graph = flat_graph(3, 3);
        let mut center: Vec<usize> = graph.neighbors(4).collect();
        center.sort();
        assert_eq!(center, vec![1, 3, 5, 7]);
        assert!(graph.edges().all(|(a, b)| {
            let (ay, ax) = (a / 3, a % 3);
            let (by, bx) = (b / 3, b % 3);
            ay.abs_diff(by) + ax.abs_diff(bx) == 1
        }));
    }

    #[test]
    fn test_degenerate_shapes() {
        let single = flat_graph(1, 1);
        assert_eq!(single.node_count(), 1);
        assert_eq!(single.edge_count(), 0);

        let line = flat_graph(1, 4);
        assert_eq!(line.edge_count(), 3);
        assert_eq!(line.degree(0), 1);
        assert_eq!(line.degree(1), 2);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let graph = flat_graph(4, 3);
        for node in 0..graph.node_count() {
            for nb in graph.neighbors(node) {
                assert!(graph.neighbors(nb).any(|back| back == node));
            }
        }
        let mut listed: Vec<(usize, usize)> = (0..graph.node_count())
            .flat_map(|a| graph.neighbors(a).filter(move |&b| a < b).map(move |b| (a, b)))
            .collect();
        listed.sort();
        let mut edges: Vec<(usize, usize)> = graph.edges().collect();
        edges.sort();
        assert_eq!(listed, edges);
    }

    #[test]
    fn test_node_values_follow_cells() {
        let grid = ElevationGrid::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let graph = GridGraph::from_grid(&grid);
        assert_eq!(graph.value(2), 3.0);
        assert_eq!(graph.values(), grid.values());
    }
}
