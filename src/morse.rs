//! Morse persistence of a scalar field on a graph.
//!
//! Nodes are swept in filtration order. Every node that has no already swept
//! neighbor starts a new component (an extremum). A node that touches several
//! components is a saddle: the component with the oldest extremum survives and
//! every other one dies there. The gap between an extremum's value and the
//! value of the saddle that kills it is its lifetime; on a descending sweep of
//! an elevation graph that is the topographic prominence of the peak.

use crate::union_find::UnionFind;
use crate::GridGraph;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Sweep direction of the filtration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Highest to lowest; extrema are maxima (peaks).
    Descending,
    /// Lowest to highest; extrema are minima (pits).
    Ascending,
}

impl Direction {
    /// Node ids in sweep order. Ties are broken by the lower id first.
    fn sweep_order(self, values: &[f64]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..values.len()).collect();
        match self {
            Direction::Descending => {
                order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)))
            }
            Direction::Ascending => {
                order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)))
            }
        }
        order
    }
}

/// One cancellation in the filtration: `extremum` merges into the cell of
/// `absorbed_into` at node `saddle`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiltrationStep {
    pub extremum: usize,
    pub saddle: usize,
    pub absorbed_into: usize,
    pub birth: f64,
    pub death: f64,
    pub lifetime: f64,
}

impl std::fmt::Display for FiltrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lifetime={} extremum={} ({}) saddle={} ({}) into={}",
            self.lifetime, self.extremum, self.birth, self.saddle, self.death, self.absorbed_into
        )
    }
}

/// An extremum paired with the saddle that destroys it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersistencePair {
    pub extremum: usize,
    pub saddle: Option<usize>,
    pub birth: f64,
    pub death: Option<f64>,
    pub lifetime: f64,
}

/// Result of one sweep over a graph.
#[derive(Debug, Clone)]
pub struct MorseComplex {
    direction: Direction,
    /// Cell (extremum id) each node flows into along its steepest neighbor.
    cell_of: Vec<usize>,
    /// Extrema in birth order.
    extrema: Vec<usize>,
    /// Cancellations sorted by lifetime; ties keep merge order.
    filtration: Vec<FiltrationStep>,
    /// Extremum id -> index into `filtration`.
    death_of: HashMap<usize, usize>,
}

impl MorseComplex {
    pub fn compute(graph: &GridGraph, direction: Direction) -> Self {
        let n = graph.node_count();
        let values = graph.values();
        let order = direction.sweep_order(values);

        let mut position = vec![0usize; n];
        for (p, &node) in order.iter().enumerate() {
            position[node] = p;
        }

        let mut uf = UnionFind::new(n);
        let mut swept = vec![false; n];
        let mut cell_of = vec![0usize; n];
        let mut extrema = Vec::new();
        let mut merges = Vec::new();

        for &node in &order {
            swept[node] = true;

            // Steepest swept neighbor decides which cell the node flows into.
            let steepest = graph
                .neighbors(node)
                .filter(|&nb| swept[nb])
                .min_by_key(|&nb| position[nb]);

            let Some(steepest) = steepest else {
                cell_of[node] = node;
                extrema.push(node);
                continue;
            };
            cell_of[node] = cell_of[steepest];

            for nb in graph.neighbors(node) {
                if !swept[nb] {
                    continue;
                }
                let Some(merge) = uf.union(node, nb, &position) else {
                    continue;
                };
                // The first union only attaches the node itself.
                if merge.absorbed == node {
                    continue;
                }
                let birth = values[merge.absorbed];
                let death = values[node];
                merges.push(FiltrationStep {
                    extremum: merge.absorbed,
                    saddle: node,
                    absorbed_into: merge.survivor,
                    birth,
                    death,
                    lifetime: (birth - death).abs(),
                });
            }
        }

        let mut filtration = merges;
        filtration.sort_by(|a, b| a.lifetime.total_cmp(&b.lifetime));
        let death_of = filtration
            .iter()
            .enumerate()
            .map(|(i, step)| (step.extremum, i))
            .collect();

        debug!(
            "{:?} sweep: {} nodes, {} extrema, {} cancellations",
            direction,
            n,
            extrema.len(),
            filtration.len()
        );

        MorseComplex {
            direction,
            cell_of,
            extrema,
            filtration,
            death_of,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn filtration(&self) -> &[FiltrationStep] {
        &self.filtration
    }

    /// Extrema in the order they were born.
    pub fn extrema(&self) -> &[usize] {
        &self.extrema
    }

    /// Node ids of the extrema that never die.
    pub fn essential_extrema(&self) -> impl Iterator<Item = usize> + '_ {
        self.extrema
            .iter()
            .copied()
            .filter(|e| !self.death_of.contains_key(e))
    }

    /// Lifetime of an extremum; infinite for extrema that never die and
    /// `None` for nodes that are not extrema.
    pub fn lifetime(&self, node: usize) -> Option<f64> {
        if node >= self.cell_of.len() || self.cell_of[node] != node {
            return None;
        }
        Some(
            self.death_of
                .get(&node)
                .map_or(f64::INFINITY, |&i| self.filtration[i].lifetime),
        )
    }

    /// Saddle where an extremum dies.
    pub fn saddle(&self, node: usize) -> Option<usize> {
        self.death_of.get(&node).map(|&i| self.filtration[i].saddle)
    }

    /// Every extremum with its killing saddle, in birth order.
    pub fn persistence_pairs(&self, graph: &GridGraph) -> Vec<PersistencePair> {
        self.extrema
            .iter()
            .map(|&e| match self.death_of.get(&e) {
                Some(&i) => {
                    let step = &self.filtration[i];
                    PersistencePair {
                        extremum: e,
                        saddle: Some(step.saddle),
                        birth: step.birth,
                        death: Some(step.death),
                        lifetime: step.lifetime,
                    }
                }
                None => PersistencePair {
                    extremum: e,
                    saddle: None,
                    birth: graph.value(e),
                    death: None,
                    lifetime: f64::INFINITY,
                },
            })
            .collect()
    }

    /// Partition of all nodes into cells once every cancellation with
    /// lifetime at most `lifetime` has been applied. Keys are the surviving
    /// extrema; members are sorted by node id.
    pub fn cells_at_lifetime(&self, lifetime: f64) -> BTreeMap<usize, Vec<usize>> {
        let mut redirect: HashMap<usize, usize> = HashMap::new();
        for step in self.filtration.iter().take_while(|s| s.lifetime <= lifetime) {
            redirect.insert(step.extremum, step.absorbed_into);
        }

        let resolve = |mut ext: usize| {
            while let Some(&next) = redirect.get(&ext) {
                ext = next;
            }
            ext
        };

        let mut cells: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut resolved: HashMap<usize, usize> = HashMap::new();
        for (node, &cell) in self.cell_of.iter().enumerate() {
            let owner = *resolved.entry(cell).or_insert_with(|| resolve(cell));
            cells.entry(owner).or_default().push(node);
        }
        cells
    }
}

/// Both sweeps over one graph.
#[derive(Debug, Clone)]
pub struct MorsePersistence {
    pub descending: MorseComplex,
    pub ascending: MorseComplex,
}

/// Compute the descending (peaks) and ascending (pits) complexes of a graph.
pub fn persistence(graph: &GridGraph) -> MorsePersistence {
    MorsePersistence {
        descending: MorseComplex::compute(graph, Direction::Descending),
        ascending: MorseComplex::compute(graph, Direction::Ascending),
    }
}
