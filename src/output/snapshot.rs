//! Particle snapshot files
//!
//! A snapshot is an NPZ archive holding two point-mesh arrays of shape
//! `(n, 3)`: `proton_position` and `proton_velocity`, row `i` of both
//! belonging to the same live particle.

use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use ndarray::{Array2, Ix2, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};

use crate::error::{TracerError, TracerResult};
use crate::simulation::states::{NVec3, Particle};

pub const POSITION_ARRAY: &str = "proton_position";
pub const VELOCITY_ARRAY: &str = "proton_velocity";

/// Write the live population to `path`, positions then velocities
/// Disabled particles are skipped. If any array fails the partial archive is
/// removed, so a snapshot on disk is always complete. Returns the number of
/// particles written.
pub fn write_particles(particles: &[Particle], path: &Path) -> TracerResult<usize> {
    let live: Vec<&Particle> = particles.iter().filter(|p| !p.is_disabled()).collect();
    let positions = Array2::from_shape_fn((live.len(), 3), |(i, k)| live[i].x[k]);
    let velocities = Array2::from_shape_fn((live.len(), 3), |(i, k)| live[i].v[k]);

    let written = File::create(path).map_err(TracerError::from).and_then(|file| {
        let mut npz = NpzWriter::new(BufWriter::new(file));
        npz.add_array(POSITION_ARRAY, &positions)?;
        npz.add_array(VELOCITY_ARRAY, &velocities)?;
        npz.finish()?.flush()?;
        Ok(())
    });

    if let Err(e) = written {
        if path.exists() {
            if let Err(rm) = fs::remove_file(path) {
                log::warn!("could not remove partial snapshot {}: {}", path.display(), rm);
            }
        }
        return Err(e);
    }
    log::debug!("wrote {} particles to {}", live.len(), path.display());
    Ok(live.len())
}

fn open_archive(path: &Path) -> TracerResult<NpzReader<File>> {
    let file = File::open(path)?;
    Ok(NpzReader::new(file)?)
}

fn read_named(npz: &mut NpzReader<File>, name: &str) -> TracerResult<Array2<f64>> {
    let names = npz.names()?;
    let key = [format!("{name}.npy"), name.to_string()]
        .into_iter()
        .find(|key| names.contains(key))
        .ok_or_else(|| TracerError::MissingArray(name.to_string()))?;
    Ok(npz.by_name::<OwnedRepr<f64>, Ix2>(&key)?)
}

/// Read one named `(n, vectorsize)` array of a snapshot
pub fn read_array(path: &Path, name: &str) -> TracerResult<Array2<f64>> {
    read_named(&mut open_archive(path)?, name)
}

/// Read the (position, velocity) pairs of a particle snapshot
pub fn read_particles(path: &Path) -> TracerResult<Vec<(NVec3, NVec3)>> {
    let mut npz = open_archive(path)?;
    let x = read_named(&mut npz, POSITION_ARRAY)?;
    let v = read_named(&mut npz, VELOCITY_ARRAY)?;
    if x.ncols() != 3 || x.dim() != v.dim() {
        return Err(TracerError::MalformedSnapshot {
            path: path.display().to_string(),
            message: format!("position {:?} and velocity {:?} arrays do not pair up", x.dim(), v.dim()),
        });
    }
    Ok(x.rows()
        .into_iter()
        .zip(v.rows())
        .map(|(x, v)| (NVec3::new(x[0], x[1], x[2]), NVec3::new(v[0], v[1], v[2])))
        .collect())
}

/// Render (position, velocity) pairs as `x y z vx vy vz` lines, the analysator input format
pub fn write_sextuples<W: Write>(records: &[(NVec3, NVec3)], out: &mut W) -> std::io::Result<()> {
    for (x, v) in records {
        // {:e} keeps full precision on the way back in
        writeln!(out, "{:e} {:e} {:e} {:e} {:e} {:e}", x[0], x[1], x[2], v[0], v[1], v[2])?;
    }
    Ok(())
}

/// Parse `x y z vx vy vz` records until input ends or a record is malformed
/// Whitespace-separated like a stream extractor: records may span lines.
pub fn read_sextuples<R: BufRead>(input: R) -> Vec<(NVec3, NVec3)> {
    let mut values = Vec::new();
    'lines: for line in input.lines() {
        let Ok(line) = line else { break };
        for token in line.split_whitespace() {
            match token.parse::<f64>() {
                Ok(value) => values.push(value),
                Err(_) => break 'lines,
            }
        }
    }
    values
        .chunks_exact(6)
        .map(|r| (NVec3::new(r[0], r[1], r[2]), NVec3::new(r[3], r[4], r[5])))
        .collect()
}
