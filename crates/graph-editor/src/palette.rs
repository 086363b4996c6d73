//! Incremental add-node palette
//!
//! Keeps the search text, the current result list and the highlighted row.
//! The query is re-run on every edit and the highlight is clamped into the
//! new result range.

use crate::config::PaletteConfig;
use crate::error::Result;
use crate::graph::Graph;
use crate::registry::OperatorCatalog;
use crate::search::SearchIndex;
use crate::types::{NodeId, Point};

/// State of one palette popup
#[derive(Debug, Clone)]
pub struct PaletteSession<'a> {
    index: &'a SearchIndex,
    config: PaletteConfig,
    text: String,
    results: Vec<String>,
    highlighted: Option<usize>,
    visible: bool,
}

impl<'a> PaletteSession<'a> {
    pub fn new(index: &'a SearchIndex, config: PaletteConfig) -> Self {
        Self {
            index,
            config,
            text: String::new(),
            results: Vec::new(),
            highlighted: None,
            visible: false,
        }
    }

    /// Show the palette with empty search text
    pub fn open(&mut self) {
        self.text.clear();
        self.results.clear();
        self.highlighted = None;
        self.visible = true;
    }

    /// Hide the palette, discarding the search
    pub fn hide(&mut self) {
        self.visible = false;
        self.text.clear();
        self.results.clear();
        self.highlighted = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    /// Append a typed character; returns false when the character is ignored
    pub fn type_char(&mut self, c: char) -> bool {
        if !self.config.accepts(c) {
            return false;
        }
        self.text.push(c);
        self.refresh();
        true
    }

    /// Remove the last character
    pub fn backspace(&mut self) {
        if self.text.pop().is_some() {
            self.refresh();
        }
    }

    /// Replace the whole search text (characters the palette rejects are dropped)
    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().filter(|&c| self.config.accepts(c)).collect();
        self.refresh();
    }

    pub fn move_up(&mut self) {
        if let Some(i) = self.highlighted {
            self.highlighted = Some(i.saturating_sub(1));
        }
    }

    pub fn move_down(&mut self) {
        if let Some(i) = self.highlighted {
            if i + 1 < self.results.len() {
                self.highlighted = Some(i + 1);
            }
        }
    }

    pub fn highlighted_index(&self) -> Option<usize> {
        self.highlighted
    }

    /// Alias of the highlighted result
    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted
            .and_then(|i| self.results.get(i))
            .map(String::as_str)
    }

    /// Take the highlighted alias and close the palette
    pub fn accept(&mut self) -> Option<String> {
        let alias = self.highlighted().map(str::to_string);
        self.hide();
        alias
    }

    /// Accept the highlighted operator and place it in `graph`
    ///
    /// Returns `Ok(None)` when nothing was highlighted.
    pub fn accept_into(
        &mut self,
        graph: &mut Graph,
        catalog: &dyn OperatorCatalog,
        position: Option<Point>,
    ) -> Result<Option<NodeId>> {
        match self.accept() {
            Some(alias) => graph.instantiate(catalog, &alias, position).map(Some),
            None => Ok(None),
        }
    }

    fn refresh(&mut self) {
        self.results = self.index.query(&self.text);
        self.highlighted = if self.results.is_empty() {
            None
        } else {
            let last = self.results.len() - 1;
            Some(self.highlighted.unwrap_or(0).min(last))
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::test_catalog;
    use crate::search::SearchEntry;

    fn index() -> SearchIndex {
        SearchIndex::from_entries(vec![
            SearchEntry::new("Band-Maths", "Band Maths", "Raster"),
            SearchEntry::new("Band-Select", "Band Select", "Raster"),
            SearchEntry::new("Subset", "Subset", "Raster/Geometric"),
        ])
    }

    #[test]
    fn test_typing_updates_results() {
        let index = index();
        let mut palette = PaletteSession::new(&index, PaletteConfig::default());
        palette.open();
        assert!(palette.is_visible());
        assert_eq!(palette.highlighted(), None);

        for c in "band".chars() {
            assert!(palette.type_char(c));
        }
        assert_eq!(palette.results().len(), 2);
        assert_eq!(palette.highlighted(), Some("Band-Maths"));
    }

    #[test]
    fn test_rejected_characters() {
        let index = index();
        let mut palette = PaletteSession::new(&index, PaletteConfig::default());
        assert!(!palette.type_char('*'));
        assert_eq!(palette.text(), "");
        palette.set_text("su*b");
        assert_eq!(palette.text(), "sub");
    }

    #[test]
    fn test_navigation_is_bounded() {
        let index = index();
        let mut palette = PaletteSession::new(&index, PaletteConfig::default());
        palette.set_text("band");
        palette.move_up();
        assert_eq!(palette.highlighted_index(), Some(0));
        palette.move_down();
        palette.move_down();
        assert_eq!(palette.highlighted_index(), Some(1));
        assert_eq!(palette.highlighted(), Some("Band-Select"));
    }

    #[test]
    fn test_highlight_clamped_on_requery() {
        let index = index();
        let mut palette = PaletteSession::new(&index, PaletteConfig::default());
        palette.set_text("band");
        palette.move_down();
        assert_eq!(palette.highlighted_index(), Some(1));

        // every edit re-queries and keeps the highlight in range
        for c in " maths".chars() {
            palette.type_char(c);
        }
        assert_eq!(palette.results()[0], "Band-Maths");
        assert!(palette.highlighted_index().unwrap() < palette.results().len());

        palette.set_text("zzz");
        assert_eq!(palette.highlighted_index(), None);
        palette.backspace();
        assert_eq!(palette.text(), "zz");
    }

    #[test]
    fn test_accept_resets() {
        let index = index();
        let mut palette = PaletteSession::new(&index, PaletteConfig::default());
        palette.open();
        palette.set_text("sub");
        assert_eq!(palette.accept(), Some("Subset".to_string()));
        assert!(!palette.is_visible());
        assert_eq!(palette.text(), "");
        assert_eq!(palette.accept(), None);
    }

    #[test]
    fn test_accept_into_graph() {
        let catalog = test_catalog();
        let index = SearchIndex::new(&catalog);
        let mut graph = Graph::new();
        let mut palette = PaletteSession::new(&index, PaletteConfig::default());
        palette.open();
        palette.set_text("subset");

        let id = palette
            .accept_into(&mut graph, &catalog, Some(Point::new(40, 40)))
            .unwrap();
        assert_eq!(id.as_deref(), Some("Subset 0"));
        assert_eq!(graph.node("Subset 0").unwrap().position, Point::new(40, 40));
        assert_eq!(palette.accept_into(&mut graph, &catalog, None).unwrap(), None);
    }
}
