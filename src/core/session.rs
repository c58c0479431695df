use crate::core::catalog::Catalog;
use crate::core::selection::{SelectionChanged, SelectionSnapshot, SelectionState};
use crate::core::selector::{Candidate, IncrementalSelector};
use crate::domain::model::{Identifier, Role, Selection};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ConvertError, Result};
use std::sync::Arc;
use tokio::sync::broadcast;

/// One CRS picker and one unit picker per role, kept in agreement with the
/// [`SelectionState`].
///
/// CRS pickers only offer CRS usable on the role's axis. Unit pickers list
/// every unit but are never driven directly: they follow the CRS choice.
#[derive(Debug)]
pub struct ConverterSession {
    catalog: Arc<Catalog>,
    crs_pickers: [IncrementalSelector<Identifier>; 4],
    unit_pickers: [IncrementalSelector<Identifier>; 4],
    state: SelectionState,
}

impl ConverterSession {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let crs_pickers = Role::ALL.map(|role| {
            IncrementalSelector::new(
                catalog
                    .candidates(role.axis())
                    .map(|crs| Candidate::new(crs.label(), crs.id.clone())),
            )
        });
        let unit_pickers = Role::ALL.map(|_| {
            IncrementalSelector::new(
                catalog
                    .units()
                    .entries()
                    .iter()
                    .map(|unit| Candidate::new(unit.label(), unit.id.clone())),
            )
        });
        let state = SelectionState::new(Arc::clone(&catalog));

        Self {
            catalog,
            crs_pickers,
            unit_pickers,
            state,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SelectionChanged> {
        self.state.subscribe()
    }

    pub fn crs_picker(&self, role: Role) -> &IncrementalSelector<Identifier> {
        &self.crs_pickers[role.slot()]
    }

    pub fn unit_picker(&self, role: Role) -> &IncrementalSelector<Identifier> {
        &self.unit_pickers[role.slot()]
    }

    /// Text typed into a role's CRS picker; see `crs_picker(role).matches()`.
    pub fn set_crs_query(&mut self, role: Role, query: &str) {
        self.crs_pickers[role.slot()].set_query(query);
    }

    /// Commits typed text on the role's CRS picker and syncs its unit.
    pub fn pick_crs(&mut self, role: Role, query: &str) -> Result<Selection> {
        let slot = role.slot();
        let previous = self.crs_pickers[slot].current_index();
        let event = self.crs_pickers[slot]
            .commit(query)
            .map_err(|source| ConvertError::Selector { role, source })?;

        match self.sync_unit(role, &event.payload) {
            Ok(selection) => Ok(selection),
            Err(e) => {
                self.crs_pickers[slot].restore(previous);
                Err(e)
            }
        }
    }

    /// Programmatic selection by identifier, bypassing text filtering.
    pub fn pick_crs_by_id(&mut self, role: Role, crs_id: &Identifier) -> Result<Selection> {
        let selection = self.sync_unit(role, crs_id)?;
        self.crs_pickers[role.slot()]
            .select(crs_id)
            .map_err(|source| ConvertError::Selector { role, source })?;
        Ok(selection)
    }

    /// Applies the per-role queries of a configuration. Roles without a
    /// query are left as they are.
    pub fn apply_config<C: ConfigProvider + ?Sized>(&mut self, config: &C) -> Result<()> {
        for role in Role::ALL {
            if let Some(query) = config.selection_query(role) {
                let selection = self.pick_crs(role, query)?;
                tracing::info!("🎯 {}: {} [{}]", role, selection.crs, selection.unit);
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Result<SelectionSnapshot> {
        self.state.snapshot()
    }

    fn sync_unit(&mut self, role: Role, crs_id: &Identifier) -> Result<Selection> {
        let selection = self.state.choose_crs(role, crs_id)?.clone();
        self.unit_pickers[role.slot()]
            .select(&selection.unit)
            .map_err(|source| ConvertError::Selector { role, source })?;
        Ok(selection)
    }
}
