//! M1 class alias resolution and injected variable naming.
//!
//! Magento 1 code names classes through group aliases (`catalog/product`,
//! `catalog/product_type`, `catalog` for the module's data helper). The
//! resolver maps those to Magento 2 class names, first through explicit
//! overrides, then through the module table and the M1 naming convention.

use std::collections::BTreeMap;

use ferry_config::MigrateConfig;
use serde::Serialize;
use thiserror::Error;

/// Which M1 factory method an alias was passed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AliasKind {
    /// `getModel` / `getSingleton`
    Model,
    /// `getResourceModel`
    ResourceModel,
    /// `helper`
    Helper,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("class alias `{alias}` must map to a fully-qualified class name, got `{target}`")]
    InvalidClassTarget { alias: String, target: String },
    #[error("module alias `{module}` must map to `Vendor\\Module`, got `{target}`")]
    InvalidModuleTarget { module: String, target: String },
}

const BUILTIN_MODULES: &[(&str, &str)] = &[
    ("admin", "Magento\\User"),
    ("adminhtml", "Magento\\Backend"),
    ("api", "Magento\\Webapi"),
    ("bundle", "Magento\\Bundle"),
    ("captcha", "Magento\\Captcha"),
    ("catalog", "Magento\\Catalog"),
    ("cataloginventory", "Magento\\CatalogInventory"),
    ("catalogrule", "Magento\\CatalogRule"),
    ("catalogsearch", "Magento\\CatalogSearch"),
    ("checkout", "Magento\\Checkout"),
    ("cms", "Magento\\Cms"),
    ("configurableswatches", "Magento\\Swatches"),
    ("contacts", "Magento\\Contact"),
    ("cron", "Magento\\Cron"),
    ("customer", "Magento\\Customer"),
    ("directory", "Magento\\Directory"),
    ("downloadable", "Magento\\Downloadable"),
    ("eav", "Magento\\Eav"),
    ("giftmessage", "Magento\\GiftMessage"),
    ("importexport", "Magento\\ImportExport"),
    ("index", "Magento\\Indexer"),
    ("newsletter", "Magento\\Newsletter"),
    ("page", "Magento\\Theme"),
    ("payment", "Magento\\Payment"),
    ("paypal", "Magento\\Paypal"),
    ("persistent", "Magento\\Persistent"),
    ("productalert", "Magento\\ProductAlert"),
    ("rating", "Magento\\Review"),
    ("reports", "Magento\\Reports"),
    ("review", "Magento\\Review"),
    ("rss", "Magento\\Rss"),
    ("sales", "Magento\\Sales"),
    ("salesrule", "Magento\\SalesRule"),
    ("sendfriend", "Magento\\SendFriend"),
    ("shipping", "Magento\\Shipping"),
    ("sitemap", "Magento\\Sitemap"),
    ("tax", "Magento\\Tax"),
    ("weee", "Magento\\Weee"),
    ("widget", "Magento\\Widget"),
    ("wishlist", "Magento\\Wishlist"),
];

/// Model aliases whose M2 class does not follow the naming convention.
const BUILTIN_CLASS_ALIASES: &[(&str, &str)] = &[
    ("admin/session", "\\Magento\\Backend\\Model\\Auth\\Session"),
    ("adminhtml/session", "\\Magento\\Backend\\Model\\Session"),
    ("checkout/session", "\\Magento\\Checkout\\Model\\Session"),
    ("core/date", "\\Magento\\Framework\\Stdlib\\DateTime\\DateTime"),
    ("core/design_package", "\\Magento\\Framework\\View\\DesignInterface"),
    ("core/resource", "\\Magento\\Framework\\App\\ResourceConnection"),
    ("core/session", "\\Magento\\Framework\\Session\\SessionManager"),
    ("core/store", "\\Magento\\Store\\Model\\Store"),
    ("core/translate", "\\Magento\\Framework\\TranslateInterface"),
    ("core/url", "\\Magento\\Framework\\UrlInterface"),
    ("core/website", "\\Magento\\Store\\Model\\Website"),
    ("customer/session", "\\Magento\\Customer\\Model\\Session"),
    ("sales/quote", "\\Magento\\Quote\\Model\\Quote"),
    ("sales/quote_address", "\\Magento\\Quote\\Model\\Quote\\Address"),
    ("sales/quote_item", "\\Magento\\Quote\\Model\\Quote\\Item"),
];

/// Helpers of the M1 `Mage_Core` module, which has no M2 module of its own.
const BUILTIN_HELPER_ALIASES: &[(&str, &str)] = &[
    ("core", "\\Magento\\Framework\\Pricing\\Helper\\Data"),
    ("core/data", "\\Magento\\Framework\\Pricing\\Helper\\Data"),
    ("core/http", "\\Magento\\Framework\\HTTP\\Header"),
    ("core/string", "\\Magento\\Framework\\Stdlib\\StringUtils"),
    ("core/url", "\\Magento\\Framework\\Url\\Helper\\Data"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassAliasResolver {
    class_aliases: BTreeMap<String, String>,
    modules: BTreeMap<String, String>,
}

impl Default for ClassAliasResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassAliasResolver {
    /// Resolver with the built-in module and override tables.
    pub fn new() -> Self {
        Self {
            class_aliases: BUILTIN_CLASS_ALIASES
                .iter()
                .map(|(alias, class)| ((*alias).to_owned(), (*class).to_owned()))
                .collect(),
            modules: BUILTIN_MODULES
                .iter()
                .map(|(module, ns)| ((*module).to_owned(), (*ns).to_owned()))
                .collect(),
        }
    }

    /// Built-in tables extended with the aliases from `config`.
    pub fn from_config(config: &MigrateConfig) -> Result<Self, ResolveError> {
        let mut resolver = Self::new();
        for (module, target) in &config.module_aliases {
            resolver = resolver.with_module_alias(module, target)?;
        }
        for (alias, target) in &config.class_aliases {
            resolver = resolver.with_class_alias(alias, target)?;
        }
        Ok(resolver)
    }

    /// Map a model alias to an explicit class, overriding the convention.
    pub fn with_class_alias(mut self, alias: &str, class: &str) -> Result<Self, ResolveError> {
        let valid = class
            .strip_prefix('\\')
            .is_some_and(|rest| rest.split('\\').all(is_php_identifier));
        if !valid {
            return Err(ResolveError::InvalidClassTarget {
                alias: alias.to_owned(),
                target: class.to_owned(),
            });
        }
        self.class_aliases
            .insert(alias.trim().to_ascii_lowercase(), class.to_owned());
        Ok(self)
    }

    /// Map an M1 module prefix to an M2 `Vendor\Module` namespace.
    pub fn with_module_alias(mut self, module: &str, namespace: &str) -> Result<Self, ResolveError> {
        let segments: Vec<&str> = namespace.split('\\').collect();
        if segments.len() != 2 || !segments.iter().all(|s| is_php_identifier(s)) {
            return Err(ResolveError::InvalidModuleTarget {
                module: module.to_owned(),
                target: namespace.to_owned(),
            });
        }
        self.modules
            .insert(module.trim().to_ascii_lowercase(), namespace.to_owned());
        Ok(self)
    }

    pub fn module_namespace(&self, module: &str) -> Option<&str> {
        self.modules
            .get(&module.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Resolve an alias string (without quotes) to a fully-qualified M2 class.
    ///
    /// Returns `None` for unknown modules and malformed aliases.
    pub fn resolve(&self, alias: &str, kind: AliasKind) -> Option<String> {
        let alias = alias.trim().to_ascii_lowercase();
        if kind == AliasKind::Model {
            if let Some(class) = self.class_aliases.get(&alias) {
                return Some(class.clone());
            }
        }
        if kind == AliasKind::Helper {
            if let Some((_, class)) = BUILTIN_HELPER_ALIASES.iter().find(|(a, _)| *a == alias) {
                return Some((*class).to_owned());
            }
        }

        let (module, path) = match (kind, alias.split_once('/')) {
            (_, Some((module, path))) => (module, path),
            (AliasKind::Helper, None) => (alias.as_str(), "data"),
            (_, None) => return None,
        };

        let Some(namespace) = self.module_namespace(module) else {
            tracing::debug!(target: "ferry.migrate", alias = %alias, module, "unknown M1 module");
            return None;
        };
        let class_path = convention_path(path)?;
        let layer = match kind {
            AliasKind::Model => "Model",
            AliasKind::ResourceModel => "Model\\ResourceModel",
            AliasKind::Helper => "Helper",
        };
        Some(format!("\\{namespace}\\{layer}\\{class_path}"))
    }
}

fn is_php_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || !c.is_ascii())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii())
}

/// `product_compare_item` -> `Product\Compare\Item`
fn convention_path(path: &str) -> Option<String> {
    let mut out = String::with_capacity(path.len());
    for part in path.split('_') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        if !out.is_empty() {
            out.push('\\');
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(out)
}

fn lower_camel(segments: &[&str]) -> String {
    let joined: String = segments.concat();
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => joined,
    }
}

fn namespace_segments(class: &str) -> Vec<&str> {
    let segments: Vec<&str> = class
        .trim_start_matches('\\')
        .split('\\')
        .filter(|s| !s.is_empty())
        .collect();
    match segments.split_first() {
        // Drop the vendor.
        Some((_, rest)) if !rest.is_empty() => rest.to_vec(),
        _ => segments,
    }
}

/// Injected variable name for a class: vendor and `Model` layer dropped, the
/// rest lower-camel-cased.
///
/// `\Magento\Catalog\Model\ProductFactory` -> `catalogProductFactory`
pub fn di_variable_name(class: &str) -> String {
    let segments = namespace_segments(class);
    let kept: Vec<&str> = segments
        .iter()
        .copied()
        .filter(|segment| *segment != "Model")
        .collect();
    if kept.is_empty() {
        return lower_camel(&segments[segments.len().saturating_sub(1)..]);
    }
    lower_camel(&kept)
}

/// Injected variable name for a helper class.
///
/// `\Magento\Catalog\Helper\Data` -> `catalogHelper`,
/// `\Magento\Catalog\Helper\Product\View` -> `catalogProductViewHelper`
pub fn helper_variable_name(class: &str) -> String {
    let segments = namespace_segments(class);
    let mut kept: Vec<&str> = segments
        .iter()
        .copied()
        .filter(|segment| *segment != "Helper")
        .collect();
    if kept.len() > 1 && kept.last() == Some(&"Data") {
        kept.pop();
    }
    kept.push("Helper");
    lower_camel(&kept)
}
