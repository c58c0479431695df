use crate::core::catalog::CrsCatalog;
use crate::domain::model::Axis;

/// Positions of horizontal-capable and vertical-capable CRS inside a
/// [`CrsCatalog`], in catalog order. Only rebuilt when the catalog is reloaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogIndex {
    horizontal: Vec<usize>,
    vertical: Vec<usize>,
}

impl CatalogIndex {
    pub fn build(crs: &CrsCatalog) -> Self {
        let mut index = CatalogIndex::default();
        index.rebuild(crs);
        index
    }

    pub fn rebuild(&mut self, crs: &CrsCatalog) {
        self.horizontal.clear();
        self.vertical.clear();
        for (position, def) in crs.entries().iter().enumerate() {
            if def.kind.is_horizontal_capable() {
                self.horizontal.push(position);
            }
            if def.kind.is_vertical_capable() {
                self.vertical.push(position);
            }
        }
    }

    pub fn positions(&self, axis: Axis) -> &[usize] {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }

    pub fn horizontal_capable(&self) -> &[usize] {
        &self.horizontal
    }

    pub fn vertical_capable(&self) -> &[usize] {
        &self.vertical
    }
}
