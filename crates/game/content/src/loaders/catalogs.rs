//! Accessory and recipe catalog loaders.

use std::path::Path;

use cultivation_core::catalog::{AccessoryDefinition, RecipeDefinition};
use cultivation_core::power::SetBonus;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Accessory catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessoryCatalogFile {
    pub accessories: Vec<AccessoryDefinition>,
    #[serde(default)]
    pub sets: Vec<SetBonus>,
}

/// Loader for accessory catalogs from RON files.
pub struct AccessoryLoader;

impl AccessoryLoader {
    /// Load an accessory catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<crate::AccessoryCatalog> {
        let content = read_file(path)?;
        let file: AccessoryCatalogFile = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse accessory catalog RON: {}", e))?;
        Ok(crate::AccessoryCatalog::new(file.accessories, file.sets))
    }
}

/// Recipe catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCatalogFile {
    pub recipes: Vec<RecipeDefinition>,
}

/// Loader for recipe catalogs from RON files.
pub struct RecipeLoader;

impl RecipeLoader {
    /// Load a recipe catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<crate::RecipeCatalog> {
        let content = read_file(path)?;
        let file: RecipeCatalogFile = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse recipe catalog RON: {}", e))?;
        Ok(crate::RecipeCatalog::new(file.recipes))
    }
}
