/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Packing file I/O (A3): the `packing.xyzd` binary format, the `diameters`
ASCII sidecar, and the `packing.nfo` summary.

Grounded on `Geometry/PackingSerializer.cpp`'s `SerializePacking`/
`ReadPacking` pair. The original serializes through a custom binary stream
wrapper; this port uses plain `f64::to_le_bytes`/`from_le_bytes` since the
format is fixed, small, and does not need a general serialization
framework (no new dependency pulled in for this).

*/

use crate::error::{PackingError, Result};
use crate::geometry::{PeriodicBox, Vec3, DIMENSIONS};
use crate::particle::{Packing, Particle};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Reads a `packing.xyzd` file: `N` records of `DIMENSIONS` little-endian
/// `f64` coordinates followed by one little-endian `f64` diameter.
pub fn read_packing(path: &Path) -> Result<Packing> {
    let bytes = fs::read(path)?;
    let record_size = (DIMENSIONS + 1) * 8;
    if bytes.len() % record_size != 0 {
        return Err(PackingError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{}: truncated packing file ({} bytes is not a multiple of {record_size})", path.display(), bytes.len()),
        )));
    }

    let mut packing = Packing::with_capacity(bytes.len() / record_size);
    for record in bytes.chunks_exact(record_size) {
        let mut coordinates = Vec3::ZERO;
        for axis in 0..DIMENSIONS {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&record[axis * 8..axis * 8 + 8]);
            coordinates[axis] = f64::from_le_bytes(buf);
        }
        let mut diameter_buf = [0u8; 8];
        diameter_buf.copy_from_slice(&record[DIMENSIONS * 8..record_size]);
        let diameter = f64::from_le_bytes(diameter_buf);
        packing.push(Particle { coordinates, diameter });
    }
    Ok(packing)
}

/// Writes `packing` to `path` as `packing.xyzd`. If `path` already exists
/// it is first renamed to `<path>.prev` (actually `packing.prev.xyzd` for
/// the conventional filename) so a crash mid-write never destroys the
/// last good packing (§6, "Intermediate serialization").
pub fn write_packing(path: &Path, packing: &Packing) -> Result<()> {
    if path.exists() {
        let backup = previous_packing_path(path);
        fs::rename(path, &backup)?;
    }

    let record_size = (DIMENSIONS + 1) * 8;
    let mut bytes = Vec::with_capacity(packing.len() * record_size);
    for particle in packing {
        for axis in 0..DIMENSIONS {
            bytes.extend_from_slice(&particle.coordinates[axis].to_le_bytes());
        }
        bytes.extend_from_slice(&particle.diameter.to_le_bytes());
    }

    let mut file = fs::File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

/// `packing.xyzd` -> `packing.prev.xyzd`; any other stem is given a
/// `.prev` suffix before its extension, same idea.
fn previous_packing_path(path: &Path) -> std::path::PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("packing");
    let extension = path.extension().and_then(|s| s.to_str());
    let file_name = match extension {
        Some(ext) => format!("{stem}.prev.{ext}"),
        None => format!("{stem}.prev"),
    };
    path.with_file_name(file_name)
}

/// Reads a `diameters` file: one ASCII float per line. Returns `None` if
/// `path` does not exist, in which case callers should default every
/// diameter to `1.0` (§6).
pub fn read_diameters(path: &Path) -> Result<Option<Vec<f64>>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut text = String::new();
    fs::File::open(path)?.read_to_string(&mut text)?;

    let mut diameters = Vec::new();
    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let diameter = line
            .parse::<f64>()
            .map_err(|_| PackingError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, format!("{}: line {}: not a number: {line:?}", path.display(), line_number + 1))))?;
        diameters.push(diameter);
    }
    Ok(Some(diameters))
}

/// Applies diameters read by [`read_diameters`] (or a uniform default of
/// `1.0`) to a packing whose diameters were placeholders.
pub fn apply_diameters(packing: &mut Packing, diameters: Option<&[f64]>) -> Result<()> {
    match diameters {
        Some(diameters) if diameters.len() == packing.len() => {
            for (particle, &diameter) in packing.iter_mut().zip(diameters) {
                particle.diameter = diameter;
            }
            Ok(())
        }
        Some(diameters) => Err(PackingError::Config(format!(
            "diameters file has {} entries, but packing has {} particles",
            diameters.len(),
            packing.len()
        ))),
        None => {
            for particle in packing.iter_mut() {
                particle.diameter = 1.0;
            }
            Ok(())
        }
    }
}

/// Summary written at the end of a run (§6, `packing.nfo`).
#[derive(Debug, Clone, Copy)]
pub struct PackingInfo {
    pub particles_count: usize,
    pub box_: PeriodicBox,
    pub theoretical_porosity: f64,
    pub calculated_porosity: f64,
    pub tolerance: f64,
    pub total_wall_clock_seconds: f64,
    pub iterations_count: u64,
}

pub fn write_packing_info(path: &Path, info: &PackingInfo) -> Result<()> {
    let text = format!(
        "Particles count: {}\n\
         Packing size: {} {} {}\n\
         Theoretical porosity: {}\n\
         Calculated porosity: {}\n\
         Tolerance: {}\n\
         Total time: {} s\n\
         Iterations count: {}\n",
        info.particles_count,
        info.box_.sizes[0],
        info.box_.sizes[1],
        info.box_.sizes[2],
        info.theoretical_porosity,
        info.calculated_porosity,
        info.tolerance,
        info.total_wall_clock_seconds,
        info.iterations_count,
    );
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packing() -> Packing {
        vec![
            Particle { coordinates: Vec3::new(0.1, 0.2, 0.3), diameter: 1.0 },
            Particle { coordinates: Vec3::new(4.0, 5.0, 6.0), diameter: 0.8 },
        ]
    }

    #[test]
    fn packing_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("ls-packing-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("packing.xyzd");

        let packing = sample_packing();
        write_packing(&path, &packing).unwrap();
        let read_back = read_packing(&path).unwrap();
        assert_eq!(read_back, packing);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rewrite_preserves_the_previous_file() {
        let dir = std::env::temp_dir().join(format!("ls-packing-test-prev-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("packing.xyzd");

        write_packing(&path, &sample_packing()).unwrap();
        let mut second = sample_packing();
        second[0].diameter = 2.0;
        write_packing(&path, &second).unwrap();

        assert!(dir.join("packing.prev.xyzd").exists());
        let current = read_packing(&path).unwrap();
        assert_eq!(current, second);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_diameters_file_yields_none() {
        let path = Path::new("/nonexistent/diameters/path/for/sure");
        assert!(read_diameters(path).unwrap().is_none());
    }

    #[test]
    fn apply_diameters_defaults_to_one_when_absent() {
        let mut packing = sample_packing();
        apply_diameters(&mut packing, None).unwrap();
        assert!(packing.iter().all(|p| p.diameter == 1.0));
    }

    #[test]
    fn apply_diameters_rejects_length_mismatch() {
        let mut packing = sample_packing();
        let err = apply_diameters(&mut packing, Some(&[1.0])).unwrap_err();
        assert!(matches!(err, PackingError::Config(_)));
    }
}
