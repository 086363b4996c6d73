//! Operator catalog for node instantiation and the add-node menu
//!
//! The catalog is owned outside the editor. `OperatorCatalog` is the seam the
//! editor reads through; `OperatorRegistry` is a plain in-memory
//! implementation that hosts and tests can fill directly.
//!
//! # Usage
//!
//! ```ignore
//! use graph_editor::{OperatorDescriptor, OperatorRegistry, SearchIndex};
//!
//! let mut registry = OperatorRegistry::new();
//! registry.register(OperatorDescriptor::new("Read", "Input-Output", 0, true));
//! registry.register(OperatorDescriptor::new("Write", "Input-Output", 1, false));
//!
//! let index = SearchIndex::new(&registry);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::OperatorDescriptor;

/// Read-only source of operator descriptors
pub trait OperatorCatalog {
    /// Get the descriptor for an alias
    fn descriptor(&self, alias: &str) -> Option<Arc<OperatorDescriptor>>;

    /// All descriptors known to the catalog
    fn descriptors(&self) -> Vec<Arc<OperatorDescriptor>>;
}

/// In-memory operator catalog keyed by alias
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    entries: HashMap<String, Arc<OperatorDescriptor>>,
}

impl OperatorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operator, replacing any previous entry with the same alias
    pub fn register(&mut self, descriptor: OperatorDescriptor) {
        self.entries
            .insert(descriptor.alias.clone(), Arc::new(descriptor));
    }

    /// Check if an alias is registered
    pub fn has_operator(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// List all registered aliases, sorted
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get descriptors grouped by their full category path
    pub fn descriptors_by_category(&self) -> HashMap<String, Vec<Arc<OperatorDescriptor>>> {
        let mut grouped: HashMap<String, Vec<Arc<OperatorDescriptor>>> = HashMap::new();
        for descriptor in self.entries.values() {
            grouped
                .entry(descriptor.category.clone())
                .or_default()
                .push(descriptor.clone());
        }
        grouped
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` if they share the same alias.
    pub fn merge(&mut self, other: OperatorRegistry) {
        self.entries.extend(other.entries);
    }
}

impl OperatorCatalog for OperatorRegistry {
    fn descriptor(&self, alias: &str) -> Option<Arc<OperatorDescriptor>> {
        self.entries.get(alias).cloned()
    }

    fn descriptors(&self) -> Vec<Arc<OperatorDescriptor>> {
        self.entries.values().cloned().collect()
    }
}

impl FromIterator<OperatorDescriptor> for OperatorRegistry {
    fn from_iter<T: IntoIterator<Item = OperatorDescriptor>>(iter: T) -> Self {
        let mut registry = Self::new();
        for descriptor in iter {
            registry.register(descriptor);
        }
        registry
    }
}

/// One level of the nested "Add" menu
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMenu {
    pub name: String,
    /// Sub-menus, ordered by name
    pub submenus: Vec<CategoryMenu>,
    /// Operator aliases placed directly at this level, ordered by display name
    pub items: Vec<String>,
}

impl CategoryMenu {
    fn submenu_mut(&mut self, name: &str) -> &mut CategoryMenu {
        let index = match self.submenus.iter().position(|m| m.name == name) {
            Some(index) => index,
            None => {
                self.submenus.push(CategoryMenu {
                    name: name.to_string(),
                    ..Default::default()
                });
                self.submenus.len() - 1
            }
        };
        &mut self.submenus[index]
    }

    /// Find a nested menu by '/'-separated path
    pub fn find(&self, path: &str) -> Option<&CategoryMenu> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |menu, segment| {
                menu.submenus.iter().find(|m| m.name == segment)
            })
    }
}

/// Build the nested operator menu from category paths
///
/// Operators with an empty category land directly in the root menu.
pub fn category_tree(catalog: &dyn OperatorCatalog) -> CategoryMenu {
    let mut descriptors = catalog.descriptors();
    descriptors.sort_by(|a, b| a.label().cmp(b.label()).then_with(|| a.alias.cmp(&b.alias)));

    let mut root = CategoryMenu {
        name: "Add".to_string(),
        ..Default::default()
    };
    for descriptor in &descriptors {
        let menu = descriptor
            .category
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(&mut root, |menu, segment| menu.submenu_mut(segment));
        menu.items.push(descriptor.alias.clone());
    }
    sort_submenus(&mut root);
    root
}

fn sort_submenus(menu: &mut CategoryMenu) {
    menu.submenus.sort_by(|a, b| a.name.cmp(&b.name));
    for submenu in &mut menu.submenus {
        sort_submenus(submenu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_descriptor(alias: &str, category: &str) -> OperatorDescriptor {
        OperatorDescriptor::new(alias, category, 1, true)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = OperatorRegistry::new();
        registry.register(test_descriptor("Subset", "Raster/Geometric"));

        assert!(registry.has_operator("Subset"));
        assert!(!registry.has_operator("unknown"));

        let descriptor = registry.descriptor("Subset").unwrap();
        assert_eq!(descriptor.category, "Raster/Geometric");
        assert!(registry.descriptor("unknown").is_none());
    }

    #[test]
    fn test_merge_override() {
        let mut registry1 = OperatorRegistry::new();
        registry1.register(test_descriptor("Subset", "Original"));

        let mut registry2 = OperatorRegistry::new();
        registry2.register(test_descriptor("Subset", "Override"));
        registry2.register(test_descriptor("Resample", "Raster"));

        registry1.merge(registry2);
        assert_eq!(registry1.len(), 2);
        assert_eq!(registry1.descriptor("Subset").unwrap().category, "Override");
        assert_eq!(registry1.aliases(), vec!["Resample", "Subset"]);
    }

    #[test]
    fn test_descriptors_by_category() {
        let registry: OperatorRegistry = vec![
            test_descriptor("Read", "Input-Output"),
            test_descriptor("Write", "Input-Output"),
            test_descriptor("Subset", "Raster/Geometric"),
        ]
        .into_iter()
        .collect();

        let grouped = registry.descriptors_by_category();
        assert_eq!(grouped.get("Input-Output").unwrap().len(), 2);
        assert_eq!(grouped.get("Raster/Geometric").unwrap().len(), 1);
    }

    #[test]
    fn test_category_tree() {
        let registry: OperatorRegistry = vec![
            test_descriptor("Write", "Input-Output"),
            test_descriptor("Read", "Input-Output"),
            test_descriptor("Subset", "Raster/Geometric"),
            test_descriptor("Resample", "Raster/Geometric"),
            test_descriptor("BandMaths", "Raster"),
            test_descriptor("Loose", ""),
        ]
        .into_iter()
        .collect();

        let tree = category_tree(&registry);
        assert_eq!(tree.items, vec!["Loose"]);
        let names: Vec<&str> = tree.submenus.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Input-Output", "Raster"]);

        assert_eq!(tree.find("Input-Output").unwrap().items, vec!["Read", "Write"]);
        let raster = tree.find("Raster").unwrap();
        assert_eq!(raster.items, vec!["BandMaths"]);
        assert_eq!(
            tree.find("Raster/Geometric").unwrap().items,
            vec!["Resample", "Subset"]
        );
        assert!(tree.find("Vector").is_none());
    }
}
