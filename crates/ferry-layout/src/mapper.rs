use std::collections::BTreeMap;

use serde::Serialize;

use crate::{HandleCatalog, Result};

/// Value written for M1 handles with no M2 counterpart.
pub const OBSOLETE: &str = "obsolete";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleMapping {
    Found(String),
    Obsolete,
}

impl HandleMapping {
    /// Lowercased M2 handle, or [`OBSOLETE`].
    pub fn to_output(&self) -> String {
        match self {
            HandleMapping::Found(name) => name.to_lowercase(),
            HandleMapping::Obsolete => OBSOLETE.to_string(),
        }
    }
}

/// Matches M1 handles against the M2 handles of one area.
#[derive(Debug, Clone)]
pub struct ViewMapper {
    catalog: HandleCatalog,
}

impl ViewMapper {
    pub fn new(catalog: HandleCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &HandleCatalog {
        &self.catalog
    }

    /// Map one M1 handle; the first candidate with a match wins.
    pub fn map(&self, handle: &str, area: &str) -> Result<HandleMapping> {
        for candidate in candidates(handle, area) {
            if let Some(found) = self.catalog.find(&candidate)? {
                tracing::trace!(target: "ferry.layout", handle, candidate = %candidate, found, "handle mapped");
                return Ok(HandleMapping::Found(found.to_string()));
            }
        }
        tracing::debug!(target: "ferry.layout", handle, area, "no M2 handle");
        Ok(HandleMapping::Obsolete)
    }
}

/// `catalog_product` also matches `catalogs_product`.
fn plural_tolerant(pattern: &str) -> String {
    pattern.replace('_', ".?_")
}

fn candidates(handle: &str, area: &str) -> Vec<String> {
    let escaped = regex::escape(handle);
    let mut out = vec![escaped.clone(), plural_tolerant(&escaped)];

    if area == "adminhtml" {
        let stripped = escaped
            .strip_prefix("adminhtml_")
            .unwrap_or(&escaped)
            .to_string();
        out.push(stripped.replace('_', "_([^_]+)_"));
        out.push(format!("([^_]+)_{stripped}"));
        out.push(format!("([^_]+)_([^_]+)_{stripped}"));
        out.insert(2, stripped);
    } else {
        if let Some(rest) = escaped.strip_prefix("enterprise_") {
            out.push(plural_tolerant(&format!("magento_{rest}")));
        }
        out.push(format!("page_{escaped}"));
    }
    out
}

/// Map every handle and collect the lowercased results.
///
/// Keys are lowercased M1 handles; a handle seen twice keeps its first result.
pub fn map_area<I, S>(mapper: &ViewMapper, area: &str, handles: I) -> Result<BTreeMap<String, String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BTreeMap::new();
    for handle in handles {
        let handle = handle.as_ref();
        let key = handle.to_lowercase();
        if out.contains_key(&key) {
            continue;
        }
        let mapped = mapper.map(handle, area)?;
        out.insert(key, mapped.to_output());
    }
    Ok(out)
}
