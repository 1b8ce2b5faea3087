use crate::morse::{Direction, MorseComplex};
use crate::{ElevationGrid, GridGraph, Peak, ProminenceConfig, Result};
use std::time::Instant;
use tracing::{debug, info};

pub struct ProminenceCalculator<'a> {
    grid: &'a ElevationGrid,
}

impl<'a> ProminenceCalculator<'a> {
    pub fn new(grid: &'a ElevationGrid) -> Self {
        ProminenceCalculator { grid }
    }

    /// Build the neighbor graph, run the descending sweep and report peaks
    /// sorted by prominence.
    pub fn calculate(&self, config: &ProminenceConfig) -> Result<Vec<Peak>> {
        config.validate()?;
        info!("Starting prominence calculation...");
        let start_time = Instant::now();

        let graph = GridGraph::from_grid(self.grid);
        debug!(
            "Graph built: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let complex = MorseComplex::compute(&graph, Direction::Descending);
        info!("Persistence computed in {:.2?}", start_time.elapsed());

        let peaks = self.collect_peaks(&graph, &complex, config);
        info!(
            "Found {} peaks with prominence >= {} (total time {:.2?})",
            peaks.len(),
            config.min_prominence,
            start_time.elapsed()
        );
        Ok(peaks)
    }

    /// Turn the maxima of a descending complex into peaks.
    pub fn collect_peaks(
        &self,
        graph: &GridGraph,
        complex: &MorseComplex,
        config: &ProminenceConfig,
    ) -> Vec<Peak> {
        let relief_base = self.grid.min_elevation();
        let mut peaks = Vec::new();

        for pair in complex.persistence_pairs(graph) {
            let elevation = pair.birth;
            if config.min_elevation.map_or(false, |min| elevation < min) {
                continue;
            }

            let prominence = if pair.lifetime.is_infinite() {
                config
                    .infinity_replacement
                    .unwrap_or(elevation - relief_base)
            } else {
                pair.lifetime
            };
            if prominence < config.min_prominence {
                continue;
            }

            peaks.push(self.create_peak(pair.extremum, elevation, prominence, pair.saddle));
        }

        peaks.sort_by(|a, b| {
            b.prominence
                .total_cmp(&a.prominence)
                .then(b.elevation.total_cmp(&a.elevation))
                .then(a.index.cmp(&b.index))
        });
        if let Some(limit) = config.limit {
            peaks.truncate(limit);
        }
        peaks
    }

    fn create_peak(&self, index: usize, elevation: f64, prominence: f64, saddle: Option<usize>) -> Peak {
        let (row, col) = self.grid.index_to_coords(index);
        let mut peak = Peak::new(row, col, index, elevation).with_prominence(prominence);

        if let Some(saddle_cell) = saddle.and_then(|s| self.grid.cell(s)) {
            peak = peak.with_col(saddle_cell.row, saddle_cell.col, saddle_cell.elevation);
        }
        if let Some(gt) = self.grid.geotransform() {
            let (x, y) = gt.pixel_center(row, col);
            peak = peak.with_location(x, y);
        }

        peak
    }
}
