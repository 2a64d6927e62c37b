//! Synthetic CAMx height/pressure file generators.
//!
//! Generated streams follow the on-disk layout exactly: big-endian 32-bit
//! words, each record `[marker][time][date][cells...][marker]`, records
//! ordered `(timestep, layer, variable)` with the height record first. Two
//! payload fillings are provided:
//!
//! - [`HeightPressureSpec::indexed_bytes`] encodes each value's flat position
//!   so extraction-order bugs show up as exact value mismatches, the same
//!   trick as a `col * 1000 + row` test grid.
//! - [`HeightPressureSpec::layered_bytes`] holds values constant per layer so
//!   per-layer means are known in closed form.

/// Shape and timing of a synthetic height/pressure file.
#[derive(Debug, Clone, Copy)]
pub struct HeightPressureSpec {
    pub rows: usize,
    pub cols: usize,
    pub layers: usize,
    pub timesteps: usize,
    /// YYYYDDD date stamped on every record
    pub start_date: i32,
}

impl HeightPressureSpec {
    pub fn new(rows: usize, cols: usize, layers: usize, timesteps: usize) -> Self {
        Self {
            rows,
            cols,
            layers,
            timesteps,
            start_date: 2005185,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Words per record, cells plus markers, time and date.
    pub fn record_length(&self) -> usize {
        self.cell_count() + 4
    }

    /// Offset separating pressure payloads from height payloads in the
    /// indexed filling.
    pub fn pressure_offset(&self) -> f32 {
        (self.timesteps * self.layers * self.cell_count()) as f32
    }

    /// Height value of the layered filling, constant per layer.
    pub fn layer_height(&self, layer: usize) -> f32 {
        ((layer + 1) * 50) as f32
    }

    /// Pressure value of the layered filling, constant per layer.
    pub fn layer_pressure(&self, layer: usize) -> f32 {
        1000.0 - 25.0 * layer as f32
    }

    /// Byte stream whose payload values equal their flat extraction index,
    /// with pressure values shifted by [`pressure_offset`].
    ///
    /// [`pressure_offset`]: HeightPressureSpec::pressure_offset
    pub fn indexed_bytes(&self) -> Vec<u8> {
        let cells = self.cell_count();
        let offset = self.pressure_offset();
        self.render(|var, timestep, layer, cell| {
            let flat = ((timestep * self.layers + layer) * cells + cell) as f32;
            if var == 0 {
                flat
            } else {
                offset + flat
            }
        })
    }

    /// Byte stream with per-layer constant payloads ([`layer_height`] /
    /// [`layer_pressure`]).
    ///
    /// [`layer_height`]: HeightPressureSpec::layer_height
    /// [`layer_pressure`]: HeightPressureSpec::layer_pressure
    pub fn layered_bytes(&self) -> Vec<u8> {
        self.render(|var, _timestep, layer, _cell| {
            if var == 0 {
                self.layer_height(layer)
            } else {
                self.layer_pressure(layer)
            }
        })
    }

    /// Render the stream, computing each payload word from
    /// `(variable, timestep, layer, cell)`.
    pub fn render(&self, mut value: impl FnMut(usize, usize, usize, usize) -> f32) -> Vec<u8> {
        let cells = self.cell_count();
        let marker = (4 * (cells + 2)) as i32;
        let total_bytes = self.timesteps * self.layers * 2 * self.record_length() * 4;

        let mut out = Vec::with_capacity(total_bytes);
        for timestep in 0..self.timesteps {
            // Hour-of-run time word; tests stay within a single day.
            let time = timestep as f32;
            for layer in 0..self.layers {
                for var in 0..2 {
                    out.extend_from_slice(&marker.to_be_bytes());
                    out.extend_from_slice(&time.to_be_bytes());
                    out.extend_from_slice(&self.start_date.to_be_bytes());
                    for cell in 0..cells {
                        out.extend_from_slice(&value(var, timestep, layer, cell).to_be_bytes());
                    }
                    out.extend_from_slice(&marker.to_be_bytes());
                }
            }
        }
        out
    }
}

/// Overwrite one record's trailing marker so it disagrees with its leading
/// marker.
pub fn corrupt_trailing_marker(raw: &mut [u8], record_length: usize, record: usize) {
    let word = (record + 1) * record_length - 1;
    let base = word * 4;
    let original = i32::from_be_bytes([raw[base], raw[base + 1], raw[base + 2], raw[base + 3]]);
    raw[base..base + 4].copy_from_slice(&(original + 4).to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_length() {
        let spec = HeightPressureSpec::new(3, 4, 2, 5);
        let raw = spec.indexed_bytes();
        assert_eq!(raw.len(), 5 * 2 * 2 * (12 + 4) * 4);
    }

    #[test]
    fn test_record_framing() {
        let spec = HeightPressureSpec::new(2, 2, 1, 1);
        let raw = spec.layered_bytes();
        let word =
            |i: usize| i32::from_be_bytes([raw[i * 4], raw[i * 4 + 1], raw[i * 4 + 2], raw[i * 4 + 3]]);

        // marker counts time + date + cells in bytes
        assert_eq!(word(0), 4 * 6);
        assert_eq!(word(7), 4 * 6);
        assert_eq!(word(2), 2005185);
        let height = f32::from_be_bytes([raw[12], raw[13], raw[14], raw[15]]);
        assert_eq!(height, 50.0);
    }

    #[test]
    fn test_corrupt_trailing_marker() {
        let spec = HeightPressureSpec::new(2, 2, 1, 1);
        let mut raw = spec.indexed_bytes();
        corrupt_trailing_marker(&mut raw, spec.record_length(), 1);
        let base = (2 * spec.record_length() - 1) * 4;
        let trailing =
            i32::from_be_bytes([raw[base], raw[base + 1], raw[base + 2], raw[base + 3]]);
        assert_eq!(trailing, 4 * 6 + 4);
    }
}
