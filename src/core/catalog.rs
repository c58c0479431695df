use crate::core::index::CatalogIndex;
use crate::domain::model::{Axis, CrsDefinition, CrsKind, Identifier, UnitDefinition};
use crate::utils::error::CatalogError;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

type LoadResult<T> = std::result::Result<T, CatalogError>;

/// Catalog codes show up both as `"4326"` and `4326`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCode {
    Text(String),
    Number(i64),
}

impl RawCode {
    fn into_string(self) -> String {
        match self {
            RawCode::Text(s) => s.trim().to_string(),
            RawCode::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawUnitEntry {
    auth_name: Option<String>,
    code: Option<RawCode>,
    name: Option<String>,
    linear_units_conv: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawUnitRef {
    auth_name: Option<String>,
    code: Option<RawCode>,
}

#[derive(Debug, Deserialize)]
struct RawCrsEntry {
    auth_name: Option<String>,
    code: Option<RawCode>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    h_units: Option<RawUnitRef>,
    v_units: Option<RawUnitRef>,
}

fn required_text(index: usize, field: &'static str, value: Option<String>) -> LoadResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(CatalogError::MissingField { index, field })
}

fn required_code(index: usize, field: &'static str, value: Option<RawCode>) -> LoadResult<String> {
    required_text(index, field, value.map(RawCode::into_string))
}

fn read_path(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Unit definitions, in file order, with O(1) lookup by identifier.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    entries: Vec<UnitDefinition>,
    by_id: HashMap<Identifier, usize>,
}

impl UnitCatalog {
    pub fn from_json_str(content: &str) -> LoadResult<Self> {
        let raw: Vec<RawUnitEntry> = serde_json::from_str(content)?;
        Self::from_raw(raw)
    }

    pub fn from_reader<R: Read>(reader: R) -> LoadResult<Self> {
        let raw: Vec<RawUnitEntry> = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> LoadResult<Self> {
        Self::from_json_str(&read_path(path.as_ref())?)
    }

    fn from_raw(raw: Vec<RawUnitEntry>) -> LoadResult<Self> {
        let mut catalog = UnitCatalog::default();

        for (index, entry) in raw.into_iter().enumerate() {
            let authority = required_text(index, "auth_name", entry.auth_name)?;
            let code = required_code(index, "code", entry.code)?;
            let name = required_text(index, "name", entry.name)?;
            let factor = entry.linear_units_conv.ok_or(CatalogError::MissingField {
                index,
                field: "linear_units_conv",
            })?;

            let id = Identifier::new(authority, code);
            if !(factor.is_finite() && factor > 0.0) {
                return Err(CatalogError::InvalidConversionFactor {
                    index,
                    id,
                    value: factor,
                });
            }
            if catalog.by_id.contains_key(&id) {
                return Err(CatalogError::DuplicateIdentifier { index, id });
            }

            catalog.by_id.insert(id.clone(), catalog.entries.len());
            catalog.entries.push(UnitDefinition {
                id,
                name,
                to_meters: factor,
            });
        }

        tracing::debug!("Loaded {} unit definitions", catalog.entries.len());
        Ok(catalog)
    }

    pub fn lookup(&self, id: &Identifier) -> Option<&UnitDefinition> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[UnitDefinition] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// CRS definitions, in file order. Every unit reference is resolved against
/// a [`UnitCatalog`] at load time.
#[derive(Debug, Clone, Default)]
pub struct CrsCatalog {
    entries: Vec<CrsDefinition>,
    by_id: HashMap<Identifier, usize>,
}

impl CrsCatalog {
    pub fn from_json_str(content: &str, units: &UnitCatalog) -> LoadResult<Self> {
        let raw: Vec<RawCrsEntry> = serde_json::from_str(content)?;
        Self::from_raw(raw, units)
    }

    pub fn from_reader<R: Read>(reader: R, units: &UnitCatalog) -> LoadResult<Self> {
        let raw: Vec<RawCrsEntry> = serde_json::from_reader(reader)?;
        Self::from_raw(raw, units)
    }

    pub fn from_path<P: AsRef<Path>>(path: P, units: &UnitCatalog) -> LoadResult<Self> {
        Self::from_json_str(&read_path(path.as_ref())?, units)
    }

    fn from_raw(raw: Vec<RawCrsEntry>, units: &UnitCatalog) -> LoadResult<Self> {
        let mut catalog = CrsCatalog::default();

        for (index, entry) in raw.into_iter().enumerate() {
            let authority = required_text(index, "auth_name", entry.auth_name)?;
            let code = required_code(index, "code", entry.code)?;
            let kind_text = required_text(index, "type", entry.kind)?;
            let kind = CrsKind::parse(&kind_text).ok_or(CatalogError::UnknownKind {
                index,
                value: kind_text,
            })?;
            let id = Identifier::new(authority, code);

            let horizontal_unit =
                resolve_unit_ref(index, &id, Axis::Horizontal, entry.h_units, units)?;
            let vertical_unit = resolve_unit_ref(index, &id, Axis::Vertical, entry.v_units, units)?;

            for (axis, unit) in [
                (Axis::Horizontal, &horizontal_unit),
                (Axis::Vertical, &vertical_unit),
            ] {
                if kind.supports(axis) && unit.is_none() {
                    return Err(CatalogError::MissingUnitReference {
                        index,
                        crs: id.clone(),
                        kind,
                        axis,
                    });
                }
            }

            if catalog.by_id.contains_key(&id) {
                return Err(CatalogError::DuplicateIdentifier { index, id });
            }

            catalog.by_id.insert(id.clone(), catalog.entries.len());
            catalog.entries.push(CrsDefinition {
                id,
                name: entry.name.map(|n| n.trim().to_string()).unwrap_or_default(),
                kind,
                horizontal_unit,
                vertical_unit,
            });
        }

        tracing::debug!("Loaded {} CRS definitions", catalog.entries.len());
        Ok(catalog)
    }

    pub fn lookup(&self, id: &Identifier) -> Option<&CrsDefinition> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    /// Entries of one kind, in catalog order.
    pub fn list_by_kind(&self, kind: CrsKind) -> Vec<&CrsDefinition> {
        self.entries.iter().filter(|c| c.kind == kind).collect()
    }

    pub fn entries(&self) -> &[CrsDefinition] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn resolve_unit_ref(
    index: usize,
    crs: &Identifier,
    axis: Axis,
    raw: Option<RawUnitRef>,
    units: &UnitCatalog,
) -> LoadResult<Option<Identifier>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let (auth_field, code_field) = match axis {
        Axis::Horizontal => ("h_units.auth_name", "h_units.code"),
        Axis::Vertical => ("v_units.auth_name", "v_units.code"),
    };
    let unit = Identifier::new(
        required_text(index, auth_field, raw.auth_name)?,
        required_code(index, code_field, raw.code)?,
    );
    if units.lookup(&unit).is_none() {
        return Err(CatalogError::UnresolvedUnit {
            index,
            crs: crs.clone(),
            axis,
            unit,
        });
    }
    Ok(Some(unit))
}

/// Both catalogs plus the derived horizontal/vertical partitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    units: UnitCatalog,
    crs: CrsCatalog,
    index: CatalogIndex,
}

impl Catalog {
    pub fn new(units: UnitCatalog, crs: CrsCatalog) -> Self {
        let index = CatalogIndex::build(&crs);
        Self { units, crs, index }
    }

    pub fn from_json_strs(crs_json: &str, units_json: &str) -> LoadResult<Self> {
        let units = UnitCatalog::from_json_str(units_json)?;
        let crs = CrsCatalog::from_json_str(crs_json, &units)?;
        Ok(Self::new(units, crs))
    }

    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(crs_path: P, unit_path: Q) -> LoadResult<Self> {
        let units = UnitCatalog::from_path(unit_path)?;
        let crs = CrsCatalog::from_path(crs_path, &units)?;
        tracing::info!(
            "📚 Catalog loaded: {} CRS ({} horizontal, {} vertical), {} units",
            crs.len(),
            crs.entries().iter().filter(|c| c.kind.is_horizontal_capable()).count(),
            crs.entries().iter().filter(|c| c.kind.is_vertical_capable()).count(),
            units.len()
        );
        Ok(Self::new(units, crs))
    }

    /// Swap in freshly loaded catalogs and recompute the partitions.
    pub fn reload(&mut self, units: UnitCatalog, crs: CrsCatalog) {
        self.index.rebuild(&crs);
        self.units = units;
        self.crs = crs;
    }

    pub fn units(&self) -> &UnitCatalog {
        &self.units
    }

    pub fn crs(&self) -> &CrsCatalog {
        &self.crs
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn lookup_crs(&self, id: &Identifier) -> Option<&CrsDefinition> {
        self.crs.lookup(id)
    }

    pub fn lookup_unit(&self, id: &Identifier) -> Option<&UnitDefinition> {
        self.units.lookup(id)
    }

    /// CRS usable for the given axis, in catalog order.
    pub fn candidates(&self, axis: Axis) -> impl Iterator<Item = &CrsDefinition> + '_ {
        self.index
            .positions(axis)
            .iter()
            .map(move |&i| &self.crs.entries()[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: &str = r#"[
        {"auth_name": "EPSG", "code": "9001", "name": "metre", "linear_units_conv": 1.0},
        {"auth_name": "EPSG", "code": "9002", "name": "foot", "linear_units_conv": 0.3048},
        {"auth_name": "EPSG", "code": 9003, "name": "US survey foot", "linear_units_conv": 0.30480060960121924}
    ]"#;

    #[test]
    fn test_load_units_and_lookup() {
        let units = UnitCatalog::from_json_str(UNITS).unwrap();
        assert_eq!(units.len(), 3);
        let foot = units.lookup(&Identifier::new("EPSG", "9002")).unwrap();
        assert_eq!(foot.name, "foot");
        assert_eq!(foot.to_meters, 0.3048);
        // numeric codes are normalised to text
        assert!(units.lookup(&Identifier::new("EPSG", "9003")).is_some());
    }

    #[test]
    fn test_unit_missing_factor_fails() {
        let json = r#"[{"auth_name": "EPSG", "code": "9001", "name": "metre"}]"#;
        let err = UnitCatalog::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingField {
                index: 0,
                field: "linear_units_conv"
            }
        ));
    }

    #[test]
    fn test_unit_non_positive_factor_fails() {
        let json = r#"[{"auth_name": "EPSG", "code": "1", "name": "bad", "linear_units_conv": 0.0}]"#;
        assert!(matches!(
            UnitCatalog::from_json_str(json),
            Err(CatalogError::InvalidConversionFactor { .. })
        ));
    }

    #[test]
    fn test_duplicate_unit_fails() {
        let json = r#"[
            {"auth_name": "EPSG", "code": "9001", "name": "metre", "linear_units_conv": 1.0},
            {"auth_name": "EPSG", "code": "9001", "name": "metre again", "linear_units_conv": 1.0}
        ]"#;
        assert!(matches!(
            UnitCatalog::from_json_str(json),
            Err(CatalogError::DuplicateIdentifier { index: 1, .. })
        ));
    }

    #[test]
    fn test_crs_without_name_resolves_units() {
        let units = UnitCatalog::from_json_str(UNITS).unwrap();
        let crs_json = r#"[
            {"auth_name": "EPSG", "code": "4326", "type": "geographic 2d",
             "h_units": {"auth_name": "EPSG", "code": "9001"}}
        ]"#;
        let crs = CrsCatalog::from_json_str(crs_json, &units).unwrap();
        let wgs84 = crs.lookup(&Identifier::new("EPSG", "4326")).unwrap();
        assert_eq!(wgs84.name, "");
        assert_eq!(wgs84.kind, CrsKind::Geographic2D);
        let unit = wgs84.unit_for(Axis::Horizontal).unwrap();
        assert!(units.lookup(unit).is_some());
    }

    #[test]
    fn test_crs_with_unresolved_unit_fails() {
        let units = UnitCatalog::from_json_str(UNITS).unwrap();
        let crs_json = r#"[
            {"auth_name": "EPSG", "code": "5703", "name": "NAVD88 height", "type": "vertical",
             "v_units": {"auth_name": "EPSG", "code": "9999"}}
        ]"#;
        let err = CrsCatalog::from_json_str(crs_json, &units).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UnresolvedUnit {
                axis: Axis::Vertical,
                ..
            }
        ));
    }

    #[test]
    fn test_horizontal_crs_without_unit_fails() {
        let units = UnitCatalog::from_json_str(UNITS).unwrap();
        let crs_json = r#"[{"auth_name": "EPSG", "code": "3857", "name": "Pseudo-Mercator", "type": "projected"}]"#;
        assert!(matches!(
            CrsCatalog::from_json_str(crs_json, &units),
            Err(CatalogError::MissingUnitReference {
                axis: Axis::Horizontal,
                ..
            })
        ));
    }

    #[test]
    fn test_crs_missing_type_and_unknown_type() {
        let units = UnitCatalog::from_json_str(UNITS).unwrap();
        let missing = r#"[{"auth_name": "EPSG", "code": "1"}]"#;
        assert!(matches!(
            CrsCatalog::from_json_str(missing, &units),
            Err(CatalogError::MissingField { field: "type", .. })
        ));

        let unknown = r#"[{"auth_name": "EPSG", "code": "1", "type": "engineering"}]"#;
        assert!(matches!(
            CrsCatalog::from_json_str(unknown, &units),
            Err(CatalogError::UnknownKind { .. })
        ));
    }

    #[test]
    fn test_list_by_kind_preserves_file_order() {
        let units = UnitCatalog::from_json_str(UNITS).unwrap();
        let crs_json = r#"[
            {"auth_name": "EPSG", "code": "32631", "name": "WGS 84 / UTM zone 31N", "type": "projected",
             "h_units": {"auth_name": "EPSG", "code": "9001"}},
            {"auth_name": "EPSG", "code": "4326", "name": "WGS 84", "type": "geographic 2d",
             "h_units": {"auth_name": "EPSG", "code": "9001"}},
            {"auth_name": "EPSG", "code": "2263", "name": "NAD83 / New York Long Island (ftUS)", "type": "projected",
             "h_units": {"auth_name": "EPSG", "code": "9003"}}
        ]"#;
        let crs = CrsCatalog::from_json_str(crs_json, &units).unwrap();
        let codes: Vec<&str> = crs
            .list_by_kind(CrsKind::Projected)
            .iter()
            .map(|c| c.id.code.as_str())
            .collect();
        assert_eq!(codes, vec!["32631", "2263"]);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = UnitCatalog::from_path("does/not/exist.json").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
