//! Decoder for CAMx height/pressure binary files.
//!
//! CAMx meteorological preprocessors write "height/pressure" files as a flat
//! stream of fixed-width Fortran sequential records: big-endian 32-bit words,
//! no header, no record count, two variables (layer-top height and layer-
//! center pressure) interleaved per vertical layer per timestep. Every
//! dimension has to be inferred from the stream itself.
//!
//! Decoding is eager and all-or-nothing: [`HeightPressureFile::open`] maps
//! the file, infers the geometry, validates the record markers, and
//! materializes every field before returning. The result is immutable, so
//! accessors are plain reads and the value can be shared across threads.
//!
//! ```no_run
//! use camx_hp_parser::HeightPressureFile;
//!
//! let hp = HeightPressureFile::open("camx_height_pressure.bin", Some(65), Some(83))?;
//! let geom = hp.geometry();
//! assert_eq!(hp.hght().len(), geom.timestep_count * geom.layer_count * 65 * 83);
//! # Ok::<(), camx_common::CamxError>(())
//! ```

pub mod buffer;
pub mod geometry;
pub mod records;

use std::collections::BTreeMap;
use std::path::Path;

use bytes::Bytes;
use camx_common::{
    convert_camx_time, CamxResult, Dataset, DimName, TimeFlags, VarData, Variable,
};
use tracing::{info, warn};

pub use crate::buffer::RecordBuffer;
pub use crate::geometry::Geometry;
use crate::records::VarSlot;

/// Layer-top height field name.
pub const VAR_HGHT: &str = "HGHT";
/// Layer-center pressure field name.
pub const VAR_PRES: &str = "PRES";
/// Per-timestep time flag field name.
pub const VAR_TFLAG: &str = "TFLAG";

/// A fully decoded CAMx height/pressure file.
///
/// Construction performs all inference and validation; every accessor is a
/// pure read against the immutable result. The value is `Send + Sync`, but
/// note that decoding itself is synchronous and single-threaded.
#[derive(Debug, Clone)]
pub struct HeightPressureFile {
    geometry: Geometry,
    /// Start date of the file, YYYYDDD
    sdate: i32,
    /// Start time of the file as stored (HHMMSS or fractional hours)
    stime: f32,
    hght: Vec<f32>,
    pres: Vec<f32>,
    tflag: TimeFlags,
}

impl HeightPressureFile {
    /// Decode a file from disk, memory-mapping it read-only.
    ///
    /// `rows`/`cols` resolve the grid split; with neither supplied the legacy
    /// single-column default applies (see [`Geometry::infer`]).
    pub fn open(
        path: impl AsRef<Path>,
        rows: Option<usize>,
        cols: Option<usize>,
    ) -> CamxResult<Self> {
        Self::decode(RecordBuffer::open(path)?, rows, cols)
    }

    /// Decode an in-memory buffer with the same semantics as [`open`].
    ///
    /// [`open`]: HeightPressureFile::open
    pub fn from_bytes(data: Bytes, rows: Option<usize>, cols: Option<usize>) -> CamxResult<Self> {
        Self::decode(RecordBuffer::from_bytes(data)?, rows, cols)
    }

    fn decode(buf: RecordBuffer, rows: Option<usize>, cols: Option<usize>) -> CamxResult<Self> {
        let geometry = Geometry::infer(&buf, rows, cols)?;
        records::check_markers(&buf, &geometry)?;

        let hght = records::extract_variable(&buf, &geometry, VarSlot::Height);
        let pres = records::extract_variable(&buf, &geometry, VarSlot::Pressure);
        let (dates, times) = records::extract_time_trace(&buf, &geometry);

        for (name, field) in [(VAR_HGHT, &hght), (VAR_PRES, &pres)] {
            let uncaught = records::count_uncaught_nan(field);
            if uncaught > 0 {
                warn!(
                    variable = name,
                    count = uncaught,
                    "payload carries uncaught-NaN sentinel values"
                );
            }
        }

        let sdate = dates.first().copied().unwrap_or_default();
        let stime = times.first().copied().unwrap_or_default();
        let tflag = convert_camx_time(&dates, &times, 2)?;

        info!(
            timesteps = geometry.timestep_count,
            layers = geometry.layer_count,
            rows = geometry.rows,
            cols = geometry.cols,
            sdate,
            "decoded CAMx height/pressure file"
        );

        Ok(Self {
            geometry,
            sdate,
            stime,
            hght,
            pres,
            tflag,
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Start date, YYYYDDD.
    pub fn sdate(&self) -> i32 {
        self.sdate
    }

    /// Start time as stored in the file.
    pub fn stime(&self) -> f32 {
        self.stime
    }

    /// Layer-top heights in meters, `[timestep][layer][row][col]` order.
    pub fn hght(&self) -> &[f32] {
        &self.hght
    }

    /// Layer-center pressures in hPa, `[timestep][layer][row][col]` order.
    pub fn pres(&self) -> &[f32] {
        &self.pres
    }

    /// Per-timestep time flags, replicated across both variables.
    pub fn tflag(&self) -> &TimeFlags {
        &self.tflag
    }

    /// Dimension sizes keyed by IOAPI name.
    pub fn dimensions(&self) -> BTreeMap<DimName, usize> {
        BTreeMap::from([
            (DimName::Tstep, self.geometry.timestep_count),
            (DimName::Lay, self.geometry.layer_count),
            (DimName::Row, self.geometry.rows),
            (DimName::Col, self.geometry.cols),
            (DimName::Var, 2),
            (DimName::DateTime, 2),
        ])
    }

    /// Register the decoded fields into a dataset container.
    ///
    /// The container outlives the decoder; field data is cloned in.
    pub fn register_into(&self, dataset: &mut Dataset) -> CamxResult<()> {
        self.clone().register_owned(dataset)
    }

    /// Consume the decoded file into a freshly built dataset.
    pub fn into_dataset(self) -> CamxResult<Dataset> {
        let mut dataset = Dataset::new();
        self.register_owned(&mut dataset)?;
        Ok(dataset)
    }

    fn register_owned(self, dataset: &mut Dataset) -> CamxResult<()> {
        let geom = self.geometry;
        for (dim, size) in self.dimensions() {
            dataset.create_dimension(dim, size);
        }

        let grid_dims = vec![DimName::Tstep, DimName::Lay, DimName::Row, DimName::Col];
        let grid_shape = vec![
            geom.timestep_count,
            geom.layer_count,
            geom.rows,
            geom.cols,
        ];

        dataset.add_variable(Variable::new(
            VAR_HGHT,
            grid_dims.clone(),
            grid_shape.clone(),
            VarData::Float(self.hght),
            "m",
            "Top Height",
        )?)?;
        dataset.add_variable(Variable::new(
            VAR_PRES,
            grid_dims,
            grid_shape,
            VarData::Float(self.pres),
            "hPa",
            "Pressure at center",
        )?)?;
        dataset.add_variable(Variable::new(
            VAR_TFLAG,
            vec![DimName::Tstep, DimName::Var, DimName::DateTime],
            vec![geom.timestep_count, 2, 2],
            VarData::Int(self.tflag.into_data()),
            "<YYYYDDD,HHMMSS>",
            "Timestep-valid flags",
        )?)?;

        dataset.sdate = self.sdate;
        dataset.stime = self.stime;
        dataset.nrows = geom.rows;
        dataset.ncols = geom.cols;
        dataset.nlays = geom.layer_count;
        dataset.nvars = 2;
        dataset.nthik = 1;
        dataset.var_list = format!("{:<16}{:<16}", VAR_HGHT, VAR_PRES);
        Ok(())
    }
}
