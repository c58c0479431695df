use crate::core::catalog::Catalog;
use crate::domain::model::{
    CoordinateFrame, CrsDefinition, Identifier, Role, Selection, UnitDefinition,
};
use crate::utils::error::{ConvertError, Result, SelectionError};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast after a role's (CRS, unit) pair has been replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChanged {
    pub role: Role,
    pub selection: Selection,
}

/// The four (CRS, unit) choices. The only way to change a role is
/// [`SelectionState::choose_crs`], which derives the unit from the CRS.
#[derive(Debug)]
pub struct SelectionState {
    catalog: Arc<Catalog>,
    slots: [Option<Selection>; 4],
    events: broadcast::Sender<SelectionChanged>,
}

impl SelectionState {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            catalog,
            slots: [None, None, None, None],
            events,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SelectionChanged> {
        self.events.subscribe()
    }

    pub fn get(&self, role: Role) -> Option<&Selection> {
        self.slots[role.slot()].as_ref()
    }

    /// Selects `crs_id` for `role` and re-derives the role's unit.
    ///
    /// On error nothing changes and no event is sent.
    pub fn choose_crs(
        &mut self,
        role: Role,
        crs_id: &Identifier,
    ) -> std::result::Result<&Selection, SelectionError> {
        let selection = resolve(&self.catalog, role, crs_id)?;

        tracing::debug!("{} -> {} ({})", role, selection.crs, selection.unit);
        let slot = self.slots[role.slot()].insert(selection);
        // Nobody listening is fine.
        let _ = self.events.send(SelectionChanged {
            role,
            selection: slot.clone(),
        });
        Ok(&*slot)
    }

    /// Freezes the current choices for a conversion run.
    pub fn snapshot(&self) -> Result<SelectionSnapshot> {
        let resolve_role = |role: Role| -> Result<ResolvedSelection> {
            let selection = self
                .get(role)
                .ok_or(ConvertError::IncompleteSelection { role })?;
            ResolvedSelection::new(&self.catalog, role, selection)
        };

        Ok(SelectionSnapshot {
            input_horizontal: resolve_role(Role::InputHorizontal)?,
            input_vertical: resolve_role(Role::InputVertical)?,
            output_horizontal: resolve_role(Role::OutputHorizontal)?,
            output_vertical: resolve_role(Role::OutputVertical)?,
        })
    }
}

fn resolve(
    catalog: &Catalog,
    role: Role,
    crs_id: &Identifier,
) -> std::result::Result<Selection, SelectionError> {
    let crs = catalog
        .lookup_crs(crs_id)
        .ok_or_else(|| SelectionError::UnknownCrs(crs_id.clone()))?;

    let axis = role.axis();
    if !crs.kind.supports(axis) {
        return Err(SelectionError::IncompatibleCrsKind {
            role,
            crs: crs.id.clone(),
            kind: crs.kind,
        });
    }

    // Already enforced when the catalog was loaded.
    let unit = crs
        .unit_for(axis)
        .ok_or_else(|| SelectionError::MissingUnitReference {
            crs: crs.id.clone(),
            axis,
        })?;
    if catalog.lookup_unit(unit).is_none() {
        return Err(SelectionError::DanglingUnitReference {
            crs: crs.id.clone(),
            unit: unit.clone(),
        });
    }

    Ok(Selection {
        crs: crs.id.clone(),
        unit: unit.clone(),
    })
}

/// A selection with its definitions looked up.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSelection {
    pub crs: CrsDefinition,
    pub unit: UnitDefinition,
}

impl ResolvedSelection {
    fn new(catalog: &Catalog, role: Role, selection: &Selection) -> Result<Self> {
        let checked = resolve(catalog, role, &selection.crs)?;
        let crs = catalog
            .lookup_crs(&checked.crs)
            .ok_or_else(|| SelectionError::UnknownCrs(checked.crs.clone()))?;
        let unit = catalog.lookup_unit(&checked.unit).ok_or_else(|| {
            SelectionError::DanglingUnitReference {
                crs: checked.crs.clone(),
                unit: checked.unit.clone(),
            }
        })?;
        Ok(Self {
            crs: crs.clone(),
            unit: unit.clone(),
        })
    }

    pub fn selection(&self) -> Selection {
        Selection {
            crs: self.crs.id.clone(),
            unit: self.unit.id.clone(),
        }
    }
}

/// Immutable copy of all four roles, taken before a batch starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSnapshot {
    pub input_horizontal: ResolvedSelection,
    pub input_vertical: ResolvedSelection,
    pub output_horizontal: ResolvedSelection,
    pub output_vertical: ResolvedSelection,
}

impl SelectionSnapshot {
    pub fn get(&self, role: Role) -> &ResolvedSelection {
        match role {
            Role::InputHorizontal => &self.input_horizontal,
            Role::InputVertical => &self.input_vertical,
            Role::OutputHorizontal => &self.output_horizontal,
            Role::OutputVertical => &self.output_vertical,
        }
    }

    pub fn input_frame(&self) -> CoordinateFrame {
        CoordinateFrame {
            horizontal: self.input_horizontal.selection(),
            vertical: self.input_vertical.selection(),
        }
    }

    pub fn output_frame(&self) -> CoordinateFrame {
        CoordinateFrame {
            horizontal: self.output_horizontal.selection(),
            vertical: self.output_vertical.selection(),
        }
    }
}
