use std::collections::HashSet;

use regex::RegexBuilder;

use crate::{LayoutError, Result};

/// Handle names declared by an M1 layout file, in document order.
///
/// Every element directly under the `<layout>` root is a handle. A document
/// with a different root declares no handles.
pub fn layout_handles(xml: &str) -> Result<Vec<String>> {
    let doc = roxmltree::Document::parse(xml).map_err(|err| LayoutError::Xml(err.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "layout" {
        tracing::debug!(
            target: "ferry.layout",
            root = root.tag_name().name(),
            "not an M1 layout document"
        );
        return Ok(Vec::new());
    }

    let mut seen = HashSet::new();
    Ok(root
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect())
}

/// The set of M2 handle names of one area, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandleCatalog {
    names: Vec<String>,
}

impl HandleCatalog {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(Into::into)
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// First name matching `pattern` as a whole, ignoring case.
    pub fn find(&self, pattern: &str) -> Result<Option<&str>> {
        let re = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()
            .map_err(|err| LayoutError::Pattern {
                pattern: pattern.to_string(),
                message: err.to_string(),
            })?;
        Ok(self
            .names
            .iter()
            .find(|name| re.is_match(name))
            .map(String::as_str))
    }
}
