/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Generation configuration (A2): parses `generation.conf`-style text into a
[`GenerationConfig`].

Grounded on `Parameters/Headers/GenerationConfig.h` and the reader in
`Parameters/Sources/ExecutionParameters.cpp`, which reads one `Key: value`
pair per line, in a fixed order, into public fields. This port keeps the
fixed-order, line-oriented format (rather than switching to TOML/INI) since
that format is an on-disk contract existing `generation.conf` files already
use, but parses it with ordinary string splitting — no parser-combinator
dependency is justified for eleven scalar fields.

*/

use crate::error::{PackingError, Result};
use crate::geometry::Vec3;
use std::path::Path;
use std::str::FromStr;

/// `Boundaries mode` in `generation.conf`. Only [`BoundariesMode::Bulk`] has
/// a working generator in this port (§1, "out of scope"); the others are
/// parsed (so a config file naming them is not itself a parse error) but
/// rejected by the CLI front end before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundariesMode {
    Bulk,
    Ellipse,
    Rectangle,
    Trapezoid,
}

impl BoundariesMode {
    fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(BoundariesMode::Bulk),
            2 => Ok(BoundariesMode::Ellipse),
            3 => Ok(BoundariesMode::Rectangle),
            4 => Ok(BoundariesMode::Trapezoid),
            other => Err(PackingError::Config(format!("unknown Boundaries mode: {other}"))),
        }
    }
}

/// `Generation mode`, optional, defaults to [`GenerationMode::Poisson`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Poisson,
    PoissonInCells,
}

impl GenerationMode {
    fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(GenerationMode::Poisson),
            2 => Ok(GenerationMode::PoissonInCells),
            other => Err(PackingError::Config(format!("unknown Generation mode: {other}"))),
        }
    }
}

/// Parsed `generation.conf` contents, in the field order the original
/// reads them.
#[derive(Debug, Clone, Copy)]
pub struct GenerationConfig {
    pub particles_count: usize,
    pub packing_size: Vec3,
    pub generation_start: bool,
    pub seed: u64,
    pub steps_to_write: u64,
    pub boundaries_mode: BoundariesMode,
    pub contraction_rate: f64,
    pub alpha: Option<f64>,
    pub generation_mode: GenerationMode,
    pub final_contraction_rate: Option<f64>,
    pub contraction_rate_decrease_factor: Option<f64>,
}

impl GenerationConfig {
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields = std::collections::HashMap::new();
        for (line_number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| PackingError::Config(format!("line {}: expected `Key: value`, got {line:?}", line_number + 1)))?;
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }

        let required = |key: &str| -> Result<&String> { fields.get(key).ok_or_else(|| PackingError::Config(format!("missing required field `{key}`"))) };
        let parse_field = |key: &str, value: &str| -> Result<f64> {
            f64::from_str(value).map_err(|_| PackingError::Config(format!("field `{key}`: not a number: {value:?}")))
        };

        let particles_count = required("Particles count")?
            .parse::<usize>()
            .map_err(|_| PackingError::Config("field `Particles count`: not a non-negative integer".into()))?;

        let packing_size = {
            let raw = required("Packing size")?;
            let parts: Vec<&str> = raw.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(PackingError::Config(format!("field `Packing size`: expected 3 numbers, got {raw:?}")));
            }
            Vec3::new(parse_field("Packing size", parts[0])?, parse_field("Packing size", parts[1])?, parse_field("Packing size", parts[2])?)
        };

        let generation_start = required("Generation start")?.as_str() != "0";
        let seed = required("Seed")?.parse::<u64>().map_err(|_| PackingError::Config("field `Seed`: not an integer".into()))?;
        let steps_to_write =
            required("Steps to write")?.parse::<u64>().map_err(|_| PackingError::Config("field `Steps to write`: not an integer".into()))?;

        let boundaries_mode = BoundariesMode::from_code(
            required("Boundaries mode")?.parse::<i64>().map_err(|_| PackingError::Config("field `Boundaries mode`: not an integer".into()))?,
        )?;

        let contraction_rate = parse_field("Contraction rate", required("Contraction rate")?)?;

        let alpha = fields.get("Alpha").map(|v| parse_field("Alpha", v)).transpose()?;

        let generation_mode = match fields.get("Generation mode") {
            Some(v) => GenerationMode::from_code(v.parse::<i64>().map_err(|_| PackingError::Config("field `Generation mode`: not an integer".into()))?)?,
            None => GenerationMode::Poisson,
        };

        let final_contraction_rate = fields.get("Final contraction rate").map(|v| parse_field("Final contraction rate", v)).transpose()?;
        let contraction_rate_decrease_factor =
            fields.get("Contraction rate decrease factor").map(|v| parse_field("Contraction rate decrease factor", v)).transpose()?;

        if boundaries_mode == BoundariesMode::Trapezoid && alpha.is_none() {
            return Err(PackingError::Config("Boundaries mode 4 (Trapezoid) requires `Alpha`".into()));
        }

        Ok(GenerationConfig {
            particles_count,
            packing_size,
            generation_start,
            seed,
            steps_to_write,
            boundaries_mode,
            contraction_rate,
            alpha,
            generation_mode,
            final_contraction_rate,
            contraction_rate_decrease_factor,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Rejects configs this core cannot generate (§1, "out of scope"):
    /// everything but [`BoundariesMode::Bulk`].
    pub fn require_bulk(&self) -> Result<()> {
        if self.boundaries_mode != BoundariesMode::Bulk {
            return Err(PackingError::Config(
                "only Boundaries mode 1 (Bulk) is supported by this generator; \
                 Ellipse/Rectangle/Trapezoid packing generators are out of scope"
                    .into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Particles count: 1000
Packing size: 10.0 10.0 10.0
Generation start: 1
Seed: 42
Steps to write: 100
Boundaries mode: 1
Contraction rate: 0.001
";

    #[test]
    fn parses_required_fields_in_order() {
        let config = GenerationConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.particles_count, 1000);
        assert_eq!(config.packing_size, Vec3::new(10.0, 10.0, 10.0));
        assert!(config.generation_start);
        assert_eq!(config.seed, 42);
        assert_eq!(config.boundaries_mode, BoundariesMode::Bulk);
        assert!((config.contraction_rate - 0.001).abs() < 1e-12);
        assert_eq!(config.generation_mode, GenerationMode::Poisson);
        assert!(config.final_contraction_rate.is_none());
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let config = GenerationConfig::parse(SAMPLE).unwrap();
        assert!(config.alpha.is_none());
        assert!(config.contraction_rate_decrease_factor.is_none());
    }

    #[test]
    fn missing_required_field_is_a_config_error() {
        let broken = SAMPLE.replace("Seed: 42\n", "");
        let err = GenerationConfig::parse(&broken).unwrap_err();
        assert!(matches!(err, PackingError::Config(_)));
    }

    #[test]
    fn non_bulk_boundaries_mode_is_rejected_for_generation() {
        let non_bulk = SAMPLE.replace("Boundaries mode: 1", "Boundaries mode: 3");
        let config = GenerationConfig::parse(&non_bulk).unwrap();
        assert!(config.require_bulk().is_err());
    }

    #[test]
    fn trapezoid_without_alpha_is_rejected() {
        let trapezoid = SAMPLE.replace("Boundaries mode: 1", "Boundaries mode: 4");
        let err = GenerationConfig::parse(&trapezoid).unwrap_err();
        assert!(matches!(err, PackingError::Config(_)));
    }
}
