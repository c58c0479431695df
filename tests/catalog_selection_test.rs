use crs_convert::core::selection::SelectionChanged;
use crs_convert::domain::model::{Axis, CrsKind};
use crs_convert::utils::error::{CatalogError, ConvertError, SelectionError};
use crs_convert::{Catalog, ConverterSession, Identifier, Role};
use std::path::PathBuf;
use std::sync::Arc;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn bundled_catalog() -> Arc<Catalog> {
    let dir = data_dir();
    Arc::new(Catalog::from_paths(dir.join("crs.json"), dir.join("units.json")).unwrap())
}

#[test]
fn test_bundled_catalog_loads_and_partitions() {
    let catalog = bundled_catalog();

    assert_eq!(catalog.units().len(), 5);
    assert_eq!(catalog.crs().len(), 10);

    let horizontal: Vec<String> = catalog
        .candidates(Axis::Horizontal)
        .map(|crs| crs.id.to_string())
        .collect();
    assert_eq!(
        horizontal,
        vec!["EPSG:4326", "EPSG:3857", "EPSG:32631", "EPSG:27700", "EPSG:2263"]
    );

    let vertical: Vec<String> = catalog
        .candidates(Axis::Vertical)
        .map(|crs| crs.id.to_string())
        .collect();
    assert_eq!(
        vertical,
        vec!["EPSG:4979", "EPSG:5703", "EPSG:8228", "EPSG:5714"]
    );

    // Compound CRS are loaded but offered to no picker.
    assert_eq!(catalog.crs().list_by_kind(CrsKind::Compound).len(), 1);
}

#[test]
fn test_catalog_rejects_dangling_unit_reference() {
    let units = r#"[{"auth_name": "EPSG", "code": "9001", "name": "metre", "linear_units_conv": 1.0}]"#;
    let crs = r#"[{"auth_name": "EPSG", "code": "3857", "name": "WGS 84 / Pseudo-Mercator",
                   "type": "projected", "h_units": {"auth_name": "EPSG", "code": "9002"}}]"#;

    let err = Catalog::from_json_strs(crs, units).unwrap_err();
    assert!(matches!(err, CatalogError::UnresolvedUnit { .. }));
}

#[test]
fn test_choosing_wgs84_selects_metre() {
    let mut session = ConverterSession::new(bundled_catalog());
    let mut events = session.subscribe();

    let selection = session.pick_crs(Role::InputHorizontal, "EPSG:4326").unwrap();
    assert_eq!(selection.crs, Identifier::new("EPSG", "4326"));
    assert_eq!(selection.unit, Identifier::new("EPSG", "9001"));

    let unit = session.unit_picker(Role::InputHorizontal).current().unwrap();
    assert_eq!(unit.label, "metre  (1 m)");

    let event = events.try_recv().unwrap();
    assert_eq!(
        event,
        SelectionChanged {
            role: Role::InputHorizontal,
            selection,
        }
    );
    assert!(events.try_recv().is_err());
}

#[test]
fn test_filter_is_case_insensitive() {
    let session = ConverterSession::new(bundled_catalog());
    let picker = session.crs_picker(Role::OutputHorizontal);

    for query in ["wgs", "WGS", "Wgs", "wGS"] {
        let labels: Vec<&str> = picker.filter(query).map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "EPSG:4326 WGS 84",
                "EPSG:3857 WGS 84 / Pseudo-Mercator",
                "EPSG:32631 WGS 84 / UTM zone 31N",
            ]
        );
    }
    assert_eq!(picker.filter("").count(), picker.candidates().len());
}

#[test]
fn test_rejected_choice_leaves_state_untouched() {
    let mut session = ConverterSession::new(bundled_catalog());
    session.pick_crs(Role::OutputVertical, "EPSG:5703").unwrap();
    let mut events = session.subscribe();

    let err = session
        .pick_crs_by_id(Role::OutputVertical, &Identifier::new("EPSG", "3857"))
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Selection(SelectionError::IncompatibleCrsKind { .. })
    ));

    let err = session
        .pick_crs_by_id(Role::OutputVertical, &Identifier::new("EPSG", "0000"))
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Selection(SelectionError::UnknownCrs(_))
    ));

    assert_eq!(
        session.state().get(Role::OutputVertical).unwrap().crs,
        Identifier::new("EPSG", "5703")
    );
    assert!(events.try_recv().is_err());
}

#[test]
fn test_snapshot_requires_every_role() {
    let mut session = ConverterSession::new(bundled_catalog());
    session.pick_crs(Role::InputHorizontal, "4326").unwrap();
    session.pick_crs(Role::InputVertical, "5703").unwrap();
    session.pick_crs(Role::OutputHorizontal, "3857").unwrap();

    assert!(matches!(
        session.snapshot(),
        Err(ConvertError::IncompleteSelection {
            role: Role::OutputVertical
        })
    ));

    session.pick_crs(Role::OutputVertical, "(ft)").unwrap();
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.get(Role::OutputVertical).unit.to_meters, 0.3048);
}
