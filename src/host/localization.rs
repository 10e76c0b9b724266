use std::collections::{BTreeMap, HashMap};

use crate::config::{normalize_language, DEFAULT_CULTURE};
use crate::models::LocalizationCoverage;

/// A feature's strings for one culture.
#[derive(Debug, Clone)]
pub struct LocalizedResources {
    culture: String,
    strings: HashMap<String, String>,
}

impl LocalizedResources {
    pub fn new(culture: &str) -> Self {
        Self {
            culture: normalize_language(culture),
            strings: HashMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.insert(key.into(), value.into());
        self
    }

    pub fn culture(&self) -> &str {
        &self.culture
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// The resolved strings a view sees: default culture overlaid by the current language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedStrings {
    strings: HashMap<String, String>,
}

impl LocalizedStrings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Per-feature localized resources plus the coalesced application-wide table.
pub struct Localizer {
    language: String,
    /// Feature names in load order, so later features win in the coalesced table.
    features: Vec<String>,
    resources: HashMap<String, HashMap<String, LocalizedResources>>,
    coalesced: HashMap<String, String>,
}

impl Localizer {
    pub fn new(language: &str) -> Self {
        Self {
            language: normalize_language(language),
            features: Vec::new(),
            resources: HashMap::new(),
            coalesced: HashMap::new(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn add_feature(&mut self, feature: &str, resources: Vec<LocalizedResources>) {
        if resources.is_empty() {
            return;
        }

        let by_culture = self.resources.entry(feature.to_string()).or_default();
        for resource in resources {
            by_culture.insert(resource.culture.clone(), resource);
        }

        if !self.features.iter().any(|f| f == feature) {
            self.features.push(feature.to_string());
        }
        self.rebuild();
    }

    /// Switches the current language. Returns `false` when it was already active.
    pub fn set_language(&mut self, language: &str) -> bool {
        let language = normalize_language(language);
        if language == self.language {
            return false;
        }
        self.language = language;
        self.rebuild();
        true
    }

    /// Looks `key` up across all features.
    ///
    /// When several features declare the same key, the one loaded last wins.
    pub fn text(&self, key: &str) -> Option<String> {
        self.coalesced.get(key).cloned()
    }

    /// Looks `key` up in one feature's resources: current language first, then the default culture.
    pub fn feature_text(&self, feature: &str, key: &str) -> Option<String> {
        let by_culture = self.resources.get(feature)?;
        [self.language.as_str(), DEFAULT_CULTURE]
            .iter()
            .filter_map(|culture| by_culture.get(*culture))
            .find_map(|resource| resource.strings.get(key).cloned())
    }

    pub fn feature_strings(&self, feature: &str) -> LocalizedStrings {
        let mut strings = HashMap::new();
        if let Some(by_culture) = self.resources.get(feature) {
            overlay(&mut strings, by_culture, DEFAULT_CULTURE);
            overlay(&mut strings, by_culture, &self.language);
        }
        LocalizedStrings { strings }
    }

    /// Declared string counts per language, sorted by language.
    pub fn coverage(&self) -> Vec<LocalizationCoverage> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for resource in self.resources.values().flat_map(|by_culture| by_culture.values()) {
            *counts.entry(resource.culture.as_str()).or_default() += resource.len();
        }

        counts
            .into_iter()
            .map(|(language, string_count)| LocalizationCoverage {
                language: language.to_string(),
                string_count,
            })
            .collect()
    }

    fn rebuild(&mut self) {
        let mut coalesced = HashMap::new();
        for feature in &self.features {
            if let Some(by_culture) = self.resources.get(feature) {
                overlay(&mut coalesced, by_culture, DEFAULT_CULTURE);
                overlay(&mut coalesced, by_culture, &self.language);
            }
        }
        self.coalesced = coalesced;
    }
}

fn overlay(
    target: &mut HashMap<String, String>,
    by_culture: &HashMap<String, LocalizedResources>,
    culture: &str,
) {
    if let Some(resource) = by_culture.get(culture) {
        target.extend(resource.strings.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}
