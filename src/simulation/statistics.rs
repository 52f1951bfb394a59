//! Append-only event histograms
//!
//! Records raw `(value, label)` pairs, e.g. (y, injection time) of each
//! transmitted particle, and persists them as a flat little-endian f64
//! array with an ASCII BOV header for visualization tools.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::TracerResult;

#[derive(Debug, Clone, Default)]
pub struct Histogram {
    name: String,
    values: Vec<[f64; 2]>,
}

impl Histogram {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), values: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record one `(value, label)` pair
    pub fn add_value(&mut self, pair: [f64; 2]) {
        self.values.push(pair);
    }

    /// Append many pairs, preserving their order
    pub fn extend<I: IntoIterator<Item = [f64; 2]>>(&mut self, pairs: I) {
        self.values.extend(pairs);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Recorded pairs in insertion order
    pub fn values(&self) -> &[[f64; 2]] {
        &self.values
    }

    /// Write raw pairs as `[v0, l0, v1, l1, ...]` little-endian f64
    pub fn save(&self, path: &Path) -> TracerResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for pair in &self.values {
            out.write_all(&pair[0].to_le_bytes())?;
            out.write_all(&pair[1].to_le_bytes())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write the BOV header describing the file written by [`Histogram::save`]
    pub fn write_bov_ascii(&self, path: &Path, time_index: usize, data_file: &str) -> TracerResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "TIME: {time_index}")?;
        writeln!(out, "DATA_FILE: {data_file}")?;
        writeln!(out, "DATA_SIZE: 2 {} 1", self.values.len())?;
        writeln!(out, "DATA_FORMAT: DOUBLE")?;
        writeln!(out, "VARIABLE: {}", self.name)?;
        writeln!(out, "DATA_ENDIAN: LITTLE")?;
        writeln!(out, "CENTERING: zonal")?;
        writeln!(out, "BRICK_ORIGIN: 0 0 0")?;
        writeln!(out, "BRICK_SIZE: 1 1 1")?;
        writeln!(out, "DATA_COMPONENTS: 1")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_writes_pairs_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("h.dat");
        let mut h = Histogram::new("h");
        h.add_value([1.0, 10.0]);
        h.add_value([2.0, 20.0]);
        h.add_value([1.0, 10.0]);
        h.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let values: Vec<f64> = bytes
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(values, vec![1.0, 10.0, 2.0, 20.0, 1.0, 10.0]);
    }

    #[test]
    fn extend_keeps_order_after_single_values() {
        let mut h = Histogram::new("t");
        h.add_value([0.0, 1.0]);
        h.extend(vec![[3.0, 2.0], [-1.0, 2.0]]);
        assert_eq!(h.values(), &[[0.0, 1.0], [3.0, 2.0], [-1.0, 2.0]]);
    }

    #[test]
    fn bov_header_references_data_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("h.dat.bov");
        let mut h = Histogram::new("reflected");
        h.add_value([0.5, 3.0]);
        h.write_bov_ascii(&path, 4, "h.dat").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "TIME: 4");
        assert_eq!(lines[1], "DATA_FILE: h.dat");
        assert_eq!(lines[2], "DATA_SIZE: 2 1 1");
        assert!(lines.contains(&"VARIABLE: reflected"));
    }
}
