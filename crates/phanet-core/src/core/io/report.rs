use crate::core::models::graph::MonomerGraph;
use crate::engine::topology::NetworkTopology;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV writing failed: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("Monomer index {index} from the topology table is not in the graph")]
    StaleTopology { index: usize },
}

/// Writes one row per crosslink with its equilibrated position.
pub fn write_crosslink_positions<W: Write>(
    writer: W,
    graph: &MonomerGraph,
    topology: &NetworkTopology,
) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["id", "x", "y", "z"])?;
    for &id in topology.crosslink_ids() {
        let position = graph
            .position(id)
            .ok_or(ReportError::StaleTopology { index: id })?;
        csv_writer.write_record([
            id.to_string(),
            format!("{:.6}", position.x),
            format!("{:.6}", position.y),
            format!("{:.6}", position.z),
        ])?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes the chain stretch distribution: one row per strand with its segment
/// count and unwrapped end-to-end distance.
///
/// Strands between two crosslinks appear once (walked from the lower id);
/// strands ending on an anchor are emitted from their crosslink side.
pub fn write_chain_stretches<W: Write>(
    writer: W,
    graph: &MonomerGraph,
    topology: &NetworkTopology,
) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["from", "to", "segments", "stretch"])?;
    for (id, records) in topology.iter() {
        let position = graph
            .position(id)
            .ok_or(ReportError::StaleTopology { index: id })?;
        for record in records {
            if record.id < id && topology.contains(record.id) {
                continue;
            }
            let neighbor = graph
                .position(record.id)
                .ok_or(ReportError::StaleTopology { index: record.id })?;
            let stretch = (neighbor - position + record.jump).norm();
            csv_writer.write_record([
                id.to_string(),
                record.id.to_string(),
                record.segments.to_string(),
                format!("{stretch:.6}"),
            ])?;
        }
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
