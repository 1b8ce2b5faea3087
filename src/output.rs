//! Report writers for peaks, filtrations and the neighbor graph.

use crate::{GridGraph, MorseComplex, Peak, Result};
use serde::Serialize;
use std::io::Write;

pub const TABLE_HEADER: &str = "    prom    row    col     elev   crow   ccol    celev";

/// Fixed-width table, one peak per line.
pub fn write_table<W: Write>(writer: &mut W, peaks: &[Peak]) -> Result<()> {
    writeln!(writer, "{}", TABLE_HEADER)?;
    writeln!(writer, "{}", "-".repeat(TABLE_HEADER.len()))?;
    for peak in peaks {
        writeln!(writer, "{}", peak)?;
    }
    Ok(())
}

pub fn write_json<W: Write>(writer: &mut W, peaks: &[Peak]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, peaks)?;
    writeln!(writer)?;
    Ok(())
}

#[derive(Serialize)]
struct GraphDump<'a> {
    width: usize,
    height: usize,
    values: &'a [f64],
    edges: Vec<(usize, usize)>,
}

/// Dump nodes and edges as JSON for offline inspection.
pub fn write_graph<W: Write>(writer: &mut W, graph: &GridGraph) -> Result<()> {
    let dump = GraphDump {
        width: graph.width(),
        height: graph.height(),
        values: graph.values(),
        edges: graph.edges().collect(),
    };
    serde_json::to_writer(&mut *writer, &dump)?;
    writeln!(writer)?;
    Ok(())
}

/// One line per cancellation, in order of increasing lifetime.
pub fn write_filtration<W: Write>(writer: &mut W, complex: &MorseComplex) -> Result<()> {
    writeln!(writer, "# {:?} filtration", complex.direction())?;
    for step in complex.filtration() {
        writeln!(writer, "{}", step)?;
    }
    for extremum in complex.essential_extrema() {
        writeln!(writer, "lifetime=inf extremum={}", extremum)?;
    }
    Ok(())
}
