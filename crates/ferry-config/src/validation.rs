use thiserror::Error;

use crate::FerryConfig;

/// A semantic problem in an otherwise well-formed `ferry.toml`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("migrate.indent must be non-empty spaces or tabs, got {value:?}")]
    IndentNotWhitespace { value: String },
    #[error("migrate.class_aliases.{alias:?} must map to a fully-qualified class name (starting with `\\`), got {target:?}")]
    ClassAliasNotQualified { alias: String, target: String },
    #[error("migrate.class_aliases key {alias:?} must look like `module/path`")]
    ClassAliasMalformed { alias: String },
    #[error("migrate.module_aliases.{alias:?} must map to `Vendor\\Module`, got {target:?}")]
    ModuleAliasInvalid { alias: String, target: String },
    #[error("migrate.extensions must not contain empty entries")]
    EmptyExtension,
    #[error("layout.areas.{area} must list at least one package")]
    LayoutAreaEmpty { area: String },
}

impl FerryConfig {
    /// Check semantic constraints that TOML deserialization cannot express.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut out = Vec::new();
        validate_migrate(self, &mut out);
        validate_layout(self, &mut out);
        out
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || !c.is_ascii())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii())
}

/// `\Vendor\Module\Path\Class`
pub(crate) fn is_qualified_class_name(name: &str) -> bool {
    name.strip_prefix('\\')
        .is_some_and(|rest| rest.split('\\').all(is_identifier))
}

fn validate_migrate(config: &FerryConfig, out: &mut Vec<ConfigValidationError>) {
    let migrate = &config.migrate;

    let indent = &migrate.indent;
    if indent.is_empty() || !indent.chars().all(|c| c == ' ' || c == '\t') {
        out.push(ConfigValidationError::IndentNotWhitespace {
            value: indent.clone(),
        });
    }

    for (alias, target) in &migrate.class_aliases {
        let well_formed = alias
            .split_once('/')
            .is_some_and(|(module, path)| !module.is_empty() && !path.is_empty());
        if !well_formed {
            out.push(ConfigValidationError::ClassAliasMalformed {
                alias: alias.clone(),
            });
        }
        if !is_qualified_class_name(target) {
            out.push(ConfigValidationError::ClassAliasNotQualified {
                alias: alias.clone(),
                target: target.clone(),
            });
        }
    }

    for (alias, target) in &migrate.module_aliases {
        let segments: Vec<&str> = target.split('\\').collect();
        if alias.is_empty() || segments.len() != 2 || !segments.iter().all(|s| is_identifier(s)) {
            out.push(ConfigValidationError::ModuleAliasInvalid {
                alias: alias.clone(),
                target: target.clone(),
            });
        }
    }

    if migrate
        .extensions
        .iter()
        .any(|ext| ext.trim_start_matches('.').is_empty())
    {
        out.push(ConfigValidationError::EmptyExtension);
    }
}

fn validate_layout(config: &FerryConfig, out: &mut Vec<ConfigValidationError>) {
    for (area, packages) in &config.layout.areas {
        if packages.is_empty() {
            out.push(ConfigValidationError::LayoutAreaEmpty { area: area.clone() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_class_names() {
        assert!(is_qualified_class_name("\\Magento\\Catalog\\Model\\Product"));
        assert!(is_qualified_class_name("\\Psr\\Log\\LoggerInterface"));
        assert!(!is_qualified_class_name("Magento\\Catalog"));
        assert!(!is_qualified_class_name("\\"));
        assert!(!is_qualified_class_name("\\Magento\\\\Catalog"));
        assert!(!is_qualified_class_name("\\Magento\\9Catalog"));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(FerryConfig::default().validate().is_empty());
    }

    #[test]
    fn empty_layout_area_is_reported() {
        let mut config = FerryConfig::default();
        config.layout.areas.insert("frontend".to_owned(), Vec::new());
        assert_eq!(
            config.validate(),
            vec![ConfigValidationError::LayoutAreaEmpty {
                area: "frontend".to_owned()
            }]
        );
    }
}
