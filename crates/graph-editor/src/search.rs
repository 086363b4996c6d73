//! Fuzzy operator lookup for the add-node flow
//!
//! The index is a snapshot of the catalog taken at construction; operators
//! registered afterwards are not visible until a new index is built.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::registry::OperatorCatalog;

/// One searchable operator
#[derive(Debug, Clone, PartialEq)]
pub struct SearchEntry {
    pub alias: String,
    pub display_name: String,
    pub category: String,
    name_lower: String,
    category_lower: String,
}

impl SearchEntry {
    pub fn new(alias: impl Into<String>, display_name: impl Into<String>, category: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let category = category.into();
        Self {
            alias: alias.into(),
            name_lower: display_name.to_lowercase(),
            category_lower: category.to_lowercase(),
            display_name,
            category,
        }
    }

    /// Match score against a token set, `None` when nothing matches
    ///
    /// A name match scores the longest matching token's length relative to
    /// the name length. A category-only match scores 0.
    pub fn score(&self, tokens: &HashSet<String>) -> Option<f64> {
        let mut best: Option<usize> = None;
        for token in tokens {
            if self.name_lower.contains(token.as_str()) {
                best = Some(best.map_or(token.len(), |b| b.max(token.len())));
            } else if self.category_lower.contains(token.as_str()) && best.is_none() {
                best = Some(0);
            }
        }
        best.map(|len| {
            if len == 0 || self.name_lower.is_empty() {
                0.0
            } else {
                len as f64 / self.name_lower.len() as f64
            }
        })
    }
}

/// A ranked search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub entry: &'a SearchEntry,
    pub score: f64,
}

/// Immutable search index over an operator catalog
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    /// Snapshot every operator in `catalog`
    pub fn new(catalog: &dyn OperatorCatalog) -> Self {
        let entries: Vec<SearchEntry> = catalog
            .descriptors()
            .iter()
            .map(|d| SearchEntry::new(d.alias.clone(), d.label(), d.category.clone()))
            .collect();
        log::debug!("Built search index with {} operators", entries.len());
        Self { entries }
    }

    pub fn from_entries(entries: Vec<SearchEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    /// Split search text into lower-case tokens
    ///
    /// Pieces are separated by `.` and spaces. The whole lower-cased text
    /// is always included as one more token.
    pub fn tokenize(text: &str) -> HashSet<String> {
        let lower = text.to_lowercase();
        let mut tokens: HashSet<String> = lower
            .split(['.', ' '])
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect();
        if !lower.is_empty() {
            tokens.insert(lower);
        }
        tokens
    }

    /// Matching entries, best score first
    ///
    /// Ties are broken by display name and then alias so the order is
    /// stable between calls.
    pub fn ranked(&self, text: &str) -> Vec<SearchHit<'_>> {
        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .filter_map(|entry| entry.score(&tokens).map(|score| SearchHit { entry, score }))
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.entry.display_name.cmp(&b.entry.display_name))
                .then_with(|| a.entry.alias.cmp(&b.entry.alias))
        });
        hits
    }

    /// Aliases of every entry whose display name or category contains a token
    pub fn query(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.ranked(text)
            .into_iter()
            .filter(|hit| seen.insert(hit.entry.alias.as_str()))
            .map(|hit| hit.entry.alias.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::OperatorDescriptor;
    use crate::registry::OperatorRegistry;

    fn index() -> SearchIndex {
        SearchIndex::from_entries(vec![
            SearchEntry::new("Subset", "Subset", ""),
            SearchEntry::new("Resample", "Resample", "Geometric"),
        ])
    }

    #[test]
    fn test_query_matches_display_name() {
        assert_eq!(index().query("sub"), vec!["Subset".to_string()]);
        assert_eq!(index().query("SUB"), vec!["Subset".to_string()]);
    }

    #[test]
    fn test_query_matches_category() {
        assert_eq!(index().query("geo"), vec!["Resample".to_string()]);
    }

    #[test]
    fn test_empty_query_has_no_results() {
        assert!(index().query("").is_empty());
        assert!(index().query(" . ").is_empty());
    }

    #[test]
    fn test_tokenize() {
        let tokens = SearchIndex::tokenize("Raster.Geo sub");
        let expected: HashSet<String> = ["raster", "geo", "sub", "raster.geo sub"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_multi_word_phrase_matches() {
        let index = SearchIndex::from_entries(vec![
            SearchEntry::new("Terrain-Correction", "Range Doppler Terrain Correction", "Radar"),
            SearchEntry::new("Write", "Write", "Input-Output"),
        ]);
        assert_eq!(index.query("doppler terrain"), vec!["Terrain-Correction".to_string()]);
    }

    #[test]
    fn test_ranking_prefers_name_matches() {
        let index = SearchIndex::from_entries(vec![
            SearchEntry::new("Terrain-Flattening", "Terrain Flattening", "Radar/Geometric"),
            SearchEntry::new("Resample", "Resample", "Raster/Geometric"),
            SearchEntry::new("Geo-Region", "Geo Region", "Raster"),
        ]);
        let hits = index.ranked("geo");
        let aliases: Vec<&str> = hits.iter().map(|h| h.entry.alias.as_str()).collect();
        // name match first, then category-only matches alphabetically
        assert_eq!(aliases, vec!["Geo-Region", "Resample", "Terrain-Flattening"]);
        assert!((hits[0].score - 0.3).abs() < f64::EPSILON);
        assert_eq!(hits[1].score, 0.0);
    }

    #[test]
    fn test_shorter_names_rank_higher() {
        let index = SearchIndex::from_entries(vec![
            SearchEntry::new("Band-Maths", "Band Maths", "Raster"),
            SearchEntry::new("Band-Select", "Band Select", "Raster"),
            SearchEntry::new("Band", "Band", "Raster"),
        ]);
        assert_eq!(index.query("band")[0], "Band");
    }

    #[test]
    fn test_index_from_catalog() {
        let registry: OperatorRegistry = vec![
            OperatorDescriptor::new("Read", "Input-Output", 0, true),
            OperatorDescriptor::new("BandMaths", "Raster", 1, true).with_display_name("Band Maths"),
        ]
        .into_iter()
        .collect();
        let index = SearchIndex::new(&registry);
        assert_eq!(index.len(), 2);
        assert_eq!(index.query("maths"), vec!["BandMaths".to_string()]);
        assert_eq!(index.query("output"), vec!["Read".to_string()]);
    }
}
