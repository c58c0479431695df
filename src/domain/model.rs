use crate::utils::error::RowError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Authority-qualified code such as `EPSG:4326`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    pub authority: String,
    pub code: String,
}

impl Identifier {
    pub fn new(authority: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

impl FromStr for Identifier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            Some((authority, code)) if !authority.is_empty() && !code.is_empty() => {
                Ok(Identifier::new(authority, code))
            }
            _ => Err(format!("expected AUTHORITY:CODE, got '{}'", s)),
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsKind {
    #[serde(rename = "projected")]
    Projected,
    #[serde(rename = "geographic 2d")]
    Geographic2D,
    #[serde(rename = "geographic 3d")]
    Geographic3D,
    #[serde(rename = "vertical")]
    Vertical,
    #[serde(rename = "compound")]
    Compound,
}

impl CrsKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "projected" => Some(CrsKind::Projected),
            "geographic 2d" => Some(CrsKind::Geographic2D),
            "geographic 3d" => Some(CrsKind::Geographic3D),
            "vertical" => Some(CrsKind::Vertical),
            "compound" => Some(CrsKind::Compound),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrsKind::Projected => "projected",
            CrsKind::Geographic2D => "geographic 2d",
            CrsKind::Geographic3D => "geographic 3d",
            CrsKind::Vertical => "vertical",
            CrsKind::Compound => "compound",
        }
    }

    pub fn is_horizontal_capable(&self) -> bool {
        matches!(self, CrsKind::Projected | CrsKind::Geographic2D)
    }

    pub fn is_vertical_capable(&self) -> bool {
        matches!(self, CrsKind::Vertical | CrsKind::Geographic3D)
    }

    pub fn supports(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.is_horizontal_capable(),
            Axis::Vertical => self.is_vertical_capable(),
        }
    }
}

impl fmt::Display for CrsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Horizontal => f.write_str("horizontal"),
            Axis::Vertical => f.write_str("vertical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    InputHorizontal,
    InputVertical,
    OutputHorizontal,
    OutputVertical,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::InputHorizontal,
        Role::InputVertical,
        Role::OutputHorizontal,
        Role::OutputVertical,
    ];

    pub fn axis(&self) -> Axis {
        match self {
            Role::InputHorizontal | Role::OutputHorizontal => Axis::Horizontal,
            Role::InputVertical | Role::OutputVertical => Axis::Vertical,
        }
    }

    pub(crate) fn slot(&self) -> usize {
        match self {
            Role::InputHorizontal => 0,
            Role::InputVertical => 1,
            Role::OutputHorizontal => 2,
            Role::OutputVertical => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::InputHorizontal => "input-horizontal",
            Role::InputVertical => "input-vertical",
            Role::OutputHorizontal => "output-horizontal",
            Role::OutputVertical => "output-vertical",
        };
        f.write_str(name)
    }
}

/// Cell position inside a coordinate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    X,
    Y,
    Z,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::X => f.write_str("x"),
            Column::Y => f.write_str("y"),
            Column::Z => f.write_str("z"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitDefinition {
    pub id: Identifier,
    pub name: String,
    /// Multiplicative factor to metres.
    pub to_meters: f64,
}

impl UnitDefinition {
    pub fn label(&self) -> String {
        format!("{}  ({} m)", self.name, self.to_meters)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrsDefinition {
    pub id: Identifier,
    pub name: String,
    pub kind: CrsKind,
    pub horizontal_unit: Option<Identifier>,
    pub vertical_unit: Option<Identifier>,
}

impl CrsDefinition {
    pub fn label(&self) -> String {
        format!("{} {}", self.id, self.name).trim_end().to_string()
    }

    pub fn unit_for(&self, axis: Axis) -> Option<&Identifier> {
        match axis {
            Axis::Horizontal => self.horizontal_unit.as_ref(),
            Axis::Vertical => self.vertical_unit.as_ref(),
        }
    }
}

/// A role's current choice. The unit always follows the CRS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub crs: Identifier,
    pub unit: Identifier,
}

/// Horizontal and vertical selections a coordinate is expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinateFrame {
    pub horizontal: Selection,
    pub vertical: Selection,
}

/// One row of the input table, still as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl RawRecord {
    pub fn new(x: impl Into<String>, y: impl Into<String>, z: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }
}

/// A converted row. `source` is the input pairing that produced it; the
/// values themselves are expressed in `frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub source: Arc<CoordinateFrame>,
    pub frame: Arc<CoordinateFrame>,
}

pub type RowResult = std::result::Result<CoordinateRecord, RowError>;

/// Output of a batch: one result per input row, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    pub rows: Vec<RowResult>,
}

impl ConversionReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.rows.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.rows.iter().filter(|r| r.is_err()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_parse_and_display() {
        let id: Identifier = "EPSG:4326".parse().unwrap();
        assert_eq!(id, Identifier::new("EPSG", "4326"));
        assert_eq!(id.to_string(), "EPSG:4326");
        assert!("4326".parse::<Identifier>().is_err());
        assert!("EPSG:".parse::<Identifier>().is_err());
    }

    #[test]
    fn test_kind_partitions() {
        assert!(CrsKind::Projected.is_horizontal_capable());
        assert!(CrsKind::Geographic2D.is_horizontal_capable());
        assert!(CrsKind::Geographic3D.is_vertical_capable());
        assert!(!CrsKind::Geographic3D.is_horizontal_capable());
        assert!(!CrsKind::Compound.is_horizontal_capable());
        assert!(!CrsKind::Compound.is_vertical_capable());
    }

    #[test]
    fn test_role_axes() {
        assert_eq!(Role::InputHorizontal.axis(), Axis::Horizontal);
        assert_eq!(Role::OutputVertical.axis(), Axis::Vertical);
        assert_eq!(Role::OutputHorizontal.to_string(), "output-horizontal");
    }

    #[test]
    fn test_labels() {
        let crs = CrsDefinition {
            id: Identifier::new("EPSG", "4326"),
            name: "WGS 84".to_string(),
            kind: CrsKind::Geographic2D,
            horizontal_unit: None,
            vertical_unit: None,
        };
        assert_eq!(crs.label(), "EPSG:4326 WGS 84");

        let unit = UnitDefinition {
            id: Identifier::new("EPSG", "9002"),
            name: "foot".to_string(),
            to_meters: 0.3048,
        };
        assert_eq!(unit.label(), "foot  (0.3048 m)");
    }
}
