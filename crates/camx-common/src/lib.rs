//! Common types shared across the camx-rs workspace.

pub mod dataset;
pub mod error;
pub mod time;

pub use dataset::{Dataset, DimName, Variable, VarData};
pub use error::{CamxError, CamxResult};
pub use time::{convert_camx_time, julian_to_date, TimeFlags};
