use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::Subject;

const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("22CS7PCCCT", "CC"),
    ("22CS7PENLP", "NLP"),
    ("22CS7PERPA", "RPA"),
    ("22CS7PENDL", "DL"),
    ("22CS7PEHCI", "HCI"),
    ("22CS7HSCFI", "CF"),
    ("22CS7NCMCI", "MOOC"),
    ("22ME2OESSE", "SE"),
];

const DEFAULT_NAMES: &[(&str, &str)] = &[
    ("22CS7PCCCT", "Cloud Computing"),
    ("22CS7PENLP", "Natural Language Processing"),
    ("22CS7PERPA", "Robot Process Automation"),
    ("22CS7PENDL", "Neural Network & Deep Learning"),
    ("22CS7PEHCI", "Human Computer Interaction"),
    ("22CS7HSCFI", "Cyber Law, Forensics & IPR"),
    ("22CS7NCMCI", "MOOCs Course"),
    ("22ME2OESSE", "Sustainable Engineering"),
];

/// Reference tables mapping subject codes to display aliases and full names.
/// Seeded with the known institution entries; replaceable from a JSON file so
/// another institution's code scheme needs no code change.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectCatalog {
    #[serde(default)]
    aliases: HashMap<String, String>,
    #[serde(default)]
    names: HashMap<String, String>,
}

impl Default for SubjectCatalog {
    fn default() -> Self {
        Self {
            aliases: owned_map(DEFAULT_ALIASES),
            names: owned_map(DEFAULT_NAMES),
        }
    }
}

impl SubjectCatalog {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let catalog: SubjectCatalog =
            serde_json::from_str(raw).context("failed to parse subject catalog json")?;
        Ok(catalog)
    }

    /// Alias falls back to the first four characters of the code.
    pub fn alias_for(&self, code: &str) -> String {
        self.aliases
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.chars().take(4).collect())
    }

    /// Full name falls back to the code itself.
    pub fn name_for(&self, code: &str) -> String {
        self.names
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    pub fn describe(&self, code: &str) -> Subject {
        Subject {
            code: code.to_string(),
            alias: self.alias_for(code),
            name: self.name_for(code),
        }
    }

    pub fn has_alias(&self, code: &str) -> bool {
        self.aliases.contains_key(code)
    }
}

fn owned_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|&(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
