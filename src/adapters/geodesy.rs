use crate::domain::model::{CrsDefinition, Identifier};
use crate::domain::ports::GeodesyProvider;
use crate::utils::error::ProviderError;
use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Sphere radius used by EPSG:3857.
const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;
const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

fn wgs84() -> Identifier {
    Identifier::new("EPSG", "4326")
}

fn web_mercator() -> Identifier {
    Identifier::new("EPSG", "3857")
}

/// Minimal in-process geodesy engine.
///
/// Knows the identity path, WGS 84 (lon/lat degrees) to and from
/// Web-Mercator metres, and constant vertical datum offsets. Anything else
/// is reported as an unsupported path for that row.
#[derive(Debug, Clone, Default)]
pub struct BuiltinGeodesy {
    vertical_offsets: HashMap<(Identifier, Identifier), f64>,
}

impl BuiltinGeodesy {
    pub fn new() -> Self {
        Self::default()
    }

    /// `dst = src + offset_m`; the reverse direction subtracts it.
    pub fn with_vertical_offset(mut self, src: Identifier, dst: Identifier, offset_m: f64) -> Self {
        self.vertical_offsets.insert((src, dst), offset_m);
        self
    }

    fn vertical_offset(&self, src: &Identifier, dst: &Identifier) -> Option<f64> {
        if let Some(offset) = self.vertical_offsets.get(&(src.clone(), dst.clone())) {
            return Some(*offset);
        }
        self.vertical_offsets
            .get(&(dst.clone(), src.clone()))
            .map(|offset| -offset)
    }
}

fn check_finite(crs: &Identifier, values: &[f64]) -> Result<(), ProviderError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ProviderError::OutOfDomain {
            crs: crs.clone(),
            reason: "coordinate is not finite".to_string(),
        })
    }
}

fn lon_lat_to_mercator(crs: &Identifier, lon: f64, lat: f64) -> Result<(f64, f64), ProviderError> {
    if lat.abs() > MERCATOR_MAX_LAT_DEG {
        return Err(ProviderError::OutOfDomain {
            crs: crs.clone(),
            reason: format!("latitude {} beyond ±{}", lat, MERCATOR_MAX_LAT_DEG),
        });
    }
    let x = WEB_MERCATOR_RADIUS_M * lon.to_radians();
    let y = WEB_MERCATOR_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Ok((x, y))
}

fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / WEB_MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / WEB_MERCATOR_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
    (lon, lat)
}

impl GeodesyProvider for BuiltinGeodesy {
    fn transform_horizontal(
        &self,
        src: &CrsDefinition,
        dst: &CrsDefinition,
        x: f64,
        y: f64,
    ) -> Result<(f64, f64), ProviderError> {
        check_finite(&src.id, &[x, y])?;
        if src.id == dst.id {
            return Ok((x, y));
        }
        if src.id == wgs84() && dst.id == web_mercator() {
            return lon_lat_to_mercator(&src.id, x, y);
        }
        if src.id == web_mercator() && dst.id == wgs84() {
            return Ok(mercator_to_lon_lat(x, y));
        }
        Err(ProviderError::UnsupportedPath {
            src: src.id.clone(),
            dst: dst.id.clone(),
        })
    }

    fn transform_vertical(
        &self,
        src: &CrsDefinition,
        dst: &CrsDefinition,
        z: f64,
    ) -> Result<f64, ProviderError> {
        check_finite(&src.id, &[z])?;
        if src.id == dst.id {
            return Ok(z);
        }
        self.vertical_offset(&src.id, &dst.id)
            .map(|offset| z + offset)
            .ok_or_else(|| ProviderError::UnsupportedPath {
                src: src.id.clone(),
                dst: dst.id.clone(),
            })
    }
}
