use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::HandleCatalog;

/// M1 layout files of `area`: `app/design/<area>/<subarea>/default/layout/`,
/// up to two directories deep, sorted per subarea.
pub fn m1_layout_files(m1_root: &Path, area: &str, subareas: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for subarea in subareas {
        let dir = m1_root
            .join("app/design")
            .join(area)
            .join(subarea)
            .join("default/layout");
        if !dir.is_dir() {
            tracing::debug!(target: "ferry.layout", dir = %dir.display(), "no layout directory");
            continue;
        }
        files.extend(xml_files(&dir, 3));
    }
    files
}

/// M2 handles visible in `area`: stems of
/// `app/code/<Vendor>/<Module>/view/{<area>,base}/layout/*.xml`.
pub fn m2_handle_catalog(m2_root: &Path, area: &str) -> HandleCatalog {
    let code = m2_root.join("app/code");
    let modules: Vec<PathBuf> = WalkDir::new(&code)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_dir() => Some(entry.into_path()),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(target: "ferry.layout", error = %err, "skipping unreadable entry");
                None
            }
        })
        .collect();

    let mut names = Vec::new();
    for scope in [area, "base"] {
        for module in &modules {
            let dir = module.join("view").join(scope).join("layout");
            if dir.is_dir() {
                names.extend(
                    xml_files(&dir, 1)
                        .iter()
                        .filter_map(|path| path.file_stem()?.to_str().map(str::to_string)),
                );
            }
        }
    }
    HandleCatalog::from_names(names)
}

fn xml_files(dir: &Path, max_depth: usize) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(target: "ferry.layout", error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "xml")
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}
