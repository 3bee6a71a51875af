use serde::{Deserialize, Serialize};

use super::SettingsStore;

/// Settings held in memory, typically loaded from the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticSettings {
    pub site_name: Option<String>,
    pub enabled_blocks: Vec<String>,
    pub system_prompt_prepend: String,
    pub system_prompt_append: String,
    pub theme_strategy: bool,
}

impl SettingsStore for StaticSettings {
    fn enabled_blocks(&self) -> Vec<String> {
        self.enabled_blocks.clone()
    }

    fn site_name(&self) -> Option<String> {
        self.site_name.clone()
    }

    fn system_prompt_prepend(&self) -> String {
        self.system_prompt_prepend.clone()
    }

    fn system_prompt_append(&self) -> String {
        self.system_prompt_append.clone()
    }

    fn theme_strategy_enabled(&self) -> bool {
        self.theme_strategy
    }
}
