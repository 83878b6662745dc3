//! Mapping of Magento 1 layout handles onto Magento 2 layout handles.
//!
//! M1 themes declare their handles as top-level elements of
//! `app/design/<area>/<package>/default/layout/*.xml`; M2 modules declare
//! one handle per file stem under `view/<area>/layout/`. The mapper tries a
//! fixed list of renaming heuristics and reports the first M2 handle that
//! matches, or `obsolete`.

mod discover;
mod handles;
mod mapper;

pub use discover::{m1_layout_files, m2_handle_catalog};
pub use handles::{layout_handles, HandleCatalog};
pub use mapper::{map_area, HandleMapping, ViewMapper, OBSOLETE};

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid layout XML: {0}")]
    Xml(String),

    #[error("invalid handle pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
}
