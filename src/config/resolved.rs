//! Resolved catalog: validated config indexed by type key for runtime lookup.

use crate::config::{CatalogConfig, MasterConfig, UiConfig};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct Catalog {
    /// Masters in catalog order; each carries the catalog-wide body aliases merged under its own.
    pub masters: Vec<MasterConfig>,
    index: HashMap<String, usize>,
}

/// UI definition as served to clients (`/api/config/masters`).
#[derive(Clone, Debug, Serialize)]
pub struct MasterUi {
    pub key: String,
    pub pk: String,
    #[serde(flatten)]
    pub ui: UiConfig,
}

impl Catalog {
    /// Build from an already validated config.
    pub(crate) fn from_config(config: CatalogConfig) -> Self {
        let CatalogConfig { aliases, mut masters } = config;
        for m in &mut masters {
            for (from, to) in &aliases {
                m.aliases.entry(from.clone()).or_insert_with(|| to.clone());
            }
            for field in &mut m.ui.fields {
                field.pattern_re = field.pattern.as_deref().and_then(|p| Regex::new(p).ok());
            }
        }
        let index = masters
            .iter()
            .enumerate()
            .map(|(i, m)| (m.key.clone(), i))
            .collect();
        Catalog { masters, index }
    }

    /// Look up a master by type key; the key is upper-cased first.
    pub fn get(&self, key: &str) -> Option<&MasterConfig> {
        self.index
            .get(&key.to_uppercase())
            .map(|&i| &self.masters[i])
    }

    pub fn ui(&self, key: &str) -> Option<MasterUi> {
        self.get(key).map(master_ui)
    }

    pub fn ui_all(&self) -> Vec<MasterUi> {
        self.masters.iter().map(master_ui).collect()
    }
}

fn master_ui(m: &MasterConfig) -> MasterUi {
    MasterUi {
        key: m.key.clone(),
        pk: m.pk.clone(),
        ui: m.ui.clone(),
    }
}
