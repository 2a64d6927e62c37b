//! Record-level extraction and structural validation.
//!
//! Every record is `[marker][time][date][cells...][marker]`, and records are
//! ordered `(timestep, layer, variable)` with the height record before the
//! pressure record of each layer. With the geometry known, every field falls
//! at a fixed offset, so extraction is plain index arithmetic into the word
//! buffer.

use camx_common::{CamxError, CamxResult};

use crate::buffer::RecordBuffer;
use crate::geometry::Geometry;

/// Which of the two interleaved per-layer records to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarSlot {
    Height = 0,
    Pressure = 1,
}

/// Bit pattern of the NaN the original CAMx tooling leaves behind when a
/// value was never written. Payloads are scanned for it after extraction.
const UNCAUGHT_NAN_BITS: u32 = 0xFFC0_0000;

/// Verify that every record's leading and trailing markers agree.
///
/// This is the only structural self-check the format offers; it runs before
/// any payload is handed to the caller.
pub fn check_markers(buf: &RecordBuffer, geom: &Geometry) -> CamxResult<()> {
    for record in 0..geom.total_records {
        let base = record * geom.record_length;
        let leading = buf.word_i32(base);
        let trailing = buf.word_i32(base + geom.record_length - 1);
        if leading != trailing {
            return Err(CamxError::Format(format!(
                "corrupt record markers at record {}: leading {} != trailing {}",
                record, leading, trailing
            )));
        }
    }
    Ok(())
}

/// Extract one variable's payload across all timesteps and layers, in
/// `[timestep][layer][row][col]` order.
pub fn extract_variable(buf: &RecordBuffer, geom: &Geometry, slot: VarSlot) -> Vec<f32> {
    let mut out = Vec::with_capacity(geom.timestep_count * geom.layer_count * geom.cell_count);
    for timestep in 0..geom.timestep_count {
        for layer in 0..geom.layer_count {
            let record = (timestep * geom.layer_count + layer) * 2 + slot as usize;
            let base = record * geom.record_length + 3;
            for cell in 0..geom.cell_count {
                out.push(buf.word_f32(base + cell));
            }
        }
    }
    out
}

/// Sample the (date, time) pair once per timestep.
///
/// The pair repeats across every layer/variable record within a timestep, so
/// only the first record of each timestep is read.
pub fn extract_time_trace(buf: &RecordBuffer, geom: &Geometry) -> (Vec<i32>, Vec<f32>) {
    let stride = geom.layer_count * 2 * geom.record_length;
    let mut dates = Vec::with_capacity(geom.timestep_count);
    let mut times = Vec::with_capacity(geom.timestep_count);
    for timestep in 0..geom.timestep_count {
        let base = timestep * stride;
        times.push(buf.word_f32(base + 1));
        dates.push(buf.word_i32(base + 2));
    }
    (dates, times)
}

/// Count payload values carrying the uncaught-NaN bit pattern.
pub fn count_uncaught_nan(values: &[f32]) -> usize {
    values
        .iter()
        .filter(|v| v.to_bits() == UNCAUGHT_NAN_BITS)
        .count()
}
