//! Named-variable dataset container with dimension bookkeeping.
//!
//! Decoded CAMx files expose their fields through this container. Where
//! possible the metadata follows IOAPI conventions (dimension names,
//! 16-character variable list entries, SDATE/STIME global attributes).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CamxError, CamxResult};

/// Dimension names used by CAMx datasets (IOAPI naming).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DimName {
    Tstep,
    Lay,
    Row,
    Col,
    Var,
    DateTime,
}

impl DimName {
    /// The IOAPI dimension name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DimName::Tstep => "TSTEP",
            DimName::Lay => "LAY",
            DimName::Row => "ROW",
            DimName::Col => "COL",
            DimName::Var => "VAR",
            DimName::DateTime => "DATE-TIME",
        }
    }
}

impl std::fmt::Display for DimName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat variable payload. CAMx fields are either f32 data or i32 flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VarData {
    Float(Vec<f32>),
    Int(Vec<i32>),
}

impl VarData {
    pub fn len(&self) -> usize {
        match self {
            VarData::Float(v) => v.len(),
            VarData::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named variable with dimensioned, row-major flat data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Dimension names, outermost first
    pub dims: Vec<DimName>,
    /// Dimension sizes, parallel to `dims`
    pub shape: Vec<usize>,
    pub data: VarData,
    pub units: String,
    /// 16-character left-justified name, IOAPI style
    pub long_name: String,
    pub var_desc: String,
}

impl Variable {
    /// Create a variable, validating that the data length matches the shape.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<DimName>,
        shape: Vec<usize>,
        data: VarData,
        units: impl Into<String>,
        var_desc: impl Into<String>,
    ) -> CamxResult<Self> {
        let name = name.into();
        if dims.len() != shape.len() {
            return Err(CamxError::Shape(format!(
                "variable {}: {} dimension names for {} sizes",
                name,
                dims.len(),
                shape.len()
            )));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(CamxError::Shape(format!(
                "variable {}: shape {:?} implies {} values, data holds {}",
                name,
                shape,
                expected,
                data.len()
            )));
        }
        let long_name = format!("{:<16}", name);
        Ok(Self {
            name,
            dims,
            shape,
            data,
            units: units.into(),
            long_name,
            var_desc: var_desc.into(),
        })
    }

    /// Row-major flat offset for a full multi-dimensional index.
    ///
    /// Returns `None` if the index rank or any component is out of range.
    pub fn flat_index(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0usize;
        for (&idx, &size) in index.iter().zip(self.shape.iter()) {
            if idx >= size {
                return None;
            }
            flat = flat * size + idx;
        }
        Some(flat)
    }

    /// Float payload, if this is a float variable.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            VarData::Float(v) => Some(v),
            VarData::Int(_) => None,
        }
    }

    /// Integer payload, if this is an integer variable.
    pub fn as_i32(&self) -> Option<&[i32]> {
        match &self.data {
            VarData::Int(v) => Some(v),
            VarData::Float(_) => None,
        }
    }

    /// Float value at a full multi-dimensional index.
    pub fn get_f32(&self, index: &[usize]) -> Option<f32> {
        let flat = self.flat_index(index)?;
        self.as_f32().map(|v| v[flat])
    }

    /// Integer value at a full multi-dimensional index.
    pub fn get_i32(&self, index: &[usize]) -> Option<i32> {
        let flat = self.flat_index(index)?;
        self.as_i32().map(|v| v[flat])
    }
}

/// Container for decoded CAMx fields and their dimension sizes.
///
/// Global attributes follow the IOAPI scalar set the original format
/// interfaces carry (`SDATE`, `STIME`, grid counts, `VAR-LIST`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    dims: BTreeMap<DimName, usize>,
    variables: BTreeMap<String, Variable>,
    /// Start date, YYYYDDD
    pub sdate: i32,
    /// Start time, HHMMSS or fractional hours as stored in the file
    pub stime: f32,
    pub nrows: usize,
    pub ncols: usize,
    pub nlays: usize,
    pub nvars: usize,
    pub nthik: usize,
    /// Concatenated 16-character variable names
    pub var_list: String,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dimension size. Re-registering an existing name replaces it.
    pub fn create_dimension(&mut self, name: DimName, size: usize) {
        self.dims.insert(name, size);
    }

    /// Size of a registered dimension.
    pub fn dimension(&self, name: DimName) -> Option<usize> {
        self.dims.get(&name).copied()
    }

    /// All registered dimension sizes.
    pub fn dimensions(&self) -> &BTreeMap<DimName, usize> {
        &self.dims
    }

    /// Register a variable, checking its dimensions against the registered
    /// sizes.
    pub fn add_variable(&mut self, var: Variable) -> CamxResult<()> {
        for (dim, &size) in var.dims.iter().zip(var.shape.iter()) {
            match self.dims.get(dim) {
                Some(&registered) if registered == size => {}
                Some(&registered) => {
                    return Err(CamxError::Shape(format!(
                        "variable {}: dimension {} is {} but dataset registers {}",
                        var.name, dim, size, registered
                    )));
                }
                None => {
                    return Err(CamxError::Shape(format!(
                        "variable {}: dimension {} is not registered",
                        var.name, dim
                    )));
                }
            }
        }
        self.variables.insert(var.name.clone(), var);
        Ok(())
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Registered variable names.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(|s| s.as_str())
    }
}
