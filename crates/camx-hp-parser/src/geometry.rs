//! Shape inference for CAMx height/pressure files.
//!
//! The format carries no header: every dimension has to be read off the byte
//! stream itself. The leading record marker gives the record length, and the
//! point where the per-record (time, date) pair first changes gives the
//! number of records per timestep (two per layer, height then pressure).

use camx_common::{CamxError, CamxResult};
use tracing::{debug, warn};

use crate::buffer::RecordBuffer;

/// Inferred dimension sizes for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Words per record, `cell_count + 4`
    pub record_length: usize,
    /// Payload cells per record, `rows * cols`
    pub cell_count: usize,
    pub rows: usize,
    pub cols: usize,
    pub layer_count: usize,
    pub timestep_count: usize,
    /// Total records in the file, `timestep_count * layer_count * 2`
    pub total_records: usize,
}

impl Geometry {
    /// Infer all dimensions from the buffer, resolving the row/column split
    /// from whatever the caller supplied.
    ///
    /// With neither `rows` nor `cols` given, the legacy single-column default
    /// (`rows = cell_count, cols = 1`) is applied; 2-D grids always need at
    /// least one of the two supplied, since the cell count alone cannot be
    /// factored unambiguously.
    pub fn infer(
        buf: &RecordBuffer,
        rows: Option<usize>,
        cols: Option<usize>,
    ) -> CamxResult<Self> {
        let total_words = buf.len_words();
        if total_words == 0 {
            return Err(CamxError::Format("buffer holds no words".to_string()));
        }

        // The leading marker counts the bytes between the markers:
        // time + date + cells, each 4 bytes wide.
        let marker = buf.word_i32(0);
        if marker <= 8 || marker % 4 != 0 {
            return Err(CamxError::Format(format!(
                "leading record marker {} is not a positive multiple of 4 covering time, date and at least one cell",
                marker
            )));
        }
        let cell_count = marker as usize / 4 - 2;
        let record_length = cell_count + 4;

        if total_words % record_length != 0 {
            return Err(CamxError::Format(format!(
                "{} words do not divide into {}-word records",
                total_words, record_length
            )));
        }
        let total_records = total_words / record_length;

        let (rows, cols) = resolve_grid(rows, cols, cell_count)?;

        // Scan the (time, date) trace for the first record that starts a new
        // timestep. A file where it never changes is a legal single-timestep
        // file.
        let t0 = buf.word_f32(1).to_bits();
        let d0 = buf.word_i32(2);
        let mut records_per_step = total_records;
        for r in 1..total_records {
            let base = r * record_length;
            if buf.word_f32(base + 1).to_bits() != t0 || buf.word_i32(base + 2) != d0 {
                records_per_step = r;
                break;
            }
        }

        if records_per_step % 2 != 0 {
            return Err(CamxError::Format(format!(
                "{} records share the first timestamp; height/pressure pairing requires an even count",
                records_per_step
            )));
        }
        let layer_count = records_per_step / 2;

        if total_records % records_per_step != 0 {
            return Err(CamxError::Format(format!(
                "{} records do not divide into timesteps of {} records ({} layers * 2 variables)",
                total_records, records_per_step, layer_count
            )));
        }
        let timestep_count = total_records / records_per_step;

        let geometry = Self {
            record_length,
            cell_count,
            rows,
            cols,
            layer_count,
            timestep_count,
            total_records,
        };
        debug!(
            record_length,
            cell_count,
            rows,
            cols,
            layers = layer_count,
            timesteps = timestep_count,
            "inferred CAMx height/pressure geometry"
        );
        debug_assert_eq!(
            timestep_count * layer_count * 2 * record_length,
            total_words
        );
        Ok(geometry)
    }
}

/// Resolve the row/column split against the inferred cell count.
fn resolve_grid(
    rows: Option<usize>,
    cols: Option<usize>,
    cell_count: usize,
) -> CamxResult<(usize, usize)> {
    match (rows, cols) {
        (Some(rows), Some(cols)) => {
            if rows * cols != cell_count {
                return Err(CamxError::DimensionMismatch {
                    rows,
                    cols,
                    cells: cell_count,
                });
            }
            Ok((rows, cols))
        }
        (Some(rows), None) => {
            if rows == 0 || cell_count % rows != 0 {
                return Err(CamxError::DimensionMismatch {
                    rows,
                    cols: if rows == 0 { 0 } else { cell_count / rows },
                    cells: cell_count,
                });
            }
            Ok((rows, cell_count / rows))
        }
        (None, Some(cols)) => {
            if cols == 0 || cell_count % cols != 0 {
                return Err(CamxError::DimensionMismatch {
                    rows: if cols == 0 { 0 } else { cell_count / cols },
                    cols,
                    cells: cell_count,
                });
            }
            Ok((cell_count / cols, cols))
        }
        (None, None) => {
            // Legacy behavior for 1-D soundings: treat the whole record as a
            // single column. Loud so 2-D callers notice the missing split.
            warn!(
                cells = cell_count,
                "no rows/cols supplied; defaulting to a {}x1 single-column grid", cell_count
            );
            Ok((cell_count, 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use test_utils::HeightPressureSpec;

    fn buffer(spec: &HeightPressureSpec) -> RecordBuffer {
        RecordBuffer::from_bytes(Bytes::from(spec.indexed_bytes())).unwrap()
    }

    #[test]
    fn test_infer_from_synthetic_file() {
        let spec = HeightPressureSpec::new(4, 5, 3, 6);
        let geom = Geometry::infer(&buffer(&spec), Some(4), Some(5)).unwrap();

        assert_eq!(geom.cell_count, 20);
        assert_eq!(geom.record_length, 24);
        assert_eq!(geom.rows, 4);
        assert_eq!(geom.cols, 5);
        assert_eq!(geom.layer_count, 3);
        assert_eq!(geom.timestep_count, 6);
        assert_eq!(geom.total_records, 36);
        assert_eq!(
            geom.timestep_count * geom.layer_count * 2 * geom.record_length,
            36 * 24
        );
    }

    #[test]
    fn test_derive_missing_dimension() {
        let spec = HeightPressureSpec::new(4, 5, 2, 2);
        let geom = Geometry::infer(&buffer(&spec), Some(4), None).unwrap();
        assert_eq!((geom.rows, geom.cols), (4, 5));

        let geom = Geometry::infer(&buffer(&spec), None, Some(5)).unwrap();
        assert_eq!((geom.rows, geom.cols), (4, 5));
    }

    #[test]
    fn test_legacy_single_column_default() {
        let spec = HeightPressureSpec::new(4, 5, 2, 2);
        let geom = Geometry::infer(&buffer(&spec), None, None).unwrap();
        assert_eq!((geom.rows, geom.cols), (20, 1));
    }

    #[test]
    fn test_inconsistent_split_rejected() {
        let spec = HeightPressureSpec::new(4, 5, 2, 2);
        let err = Geometry::infer(&buffer(&spec), Some(4), Some(6));
        assert!(matches!(
            err,
            Err(CamxError::DimensionMismatch {
                rows: 4,
                cols: 6,
                cells: 20
            })
        ));

        let err = Geometry::infer(&buffer(&spec), Some(3), None);
        assert!(matches!(err, Err(CamxError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_single_timestep_file() {
        let spec = HeightPressureSpec::new(3, 3, 4, 1);
        let geom = Geometry::infer(&buffer(&spec), Some(3), Some(3)).unwrap();
        assert_eq!(geom.timestep_count, 1);
        assert_eq!(geom.layer_count, 4);
    }

    #[test]
    fn test_non_integral_record_division() {
        let spec = HeightPressureSpec::new(3, 3, 2, 2);
        let mut raw = spec.indexed_bytes();
        // Drop the last word so total words no longer divide by the record
        // length.
        raw.truncate(raw.len() - 4);
        let buf = RecordBuffer::from_bytes(Bytes::from(raw)).unwrap();
        let err = Geometry::infer(&buf, Some(3), Some(3));
        assert!(matches!(err, Err(CamxError::Format(_))));
    }

    #[test]
    fn test_bad_leading_marker() {
        let mut raw = HeightPressureSpec::new(3, 3, 2, 2).indexed_bytes();
        raw[..4].copy_from_slice(&7i32.to_be_bytes());
        let buf = RecordBuffer::from_bytes(Bytes::from(raw)).unwrap();
        assert!(matches!(
            Geometry::infer(&buf, Some(3), Some(3)),
            Err(CamxError::Format(_))
        ));
    }
}
