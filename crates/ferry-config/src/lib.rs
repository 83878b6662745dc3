use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};

use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;

mod schema;
mod validation;

pub use schema::json_schema;
pub use validation::ConfigValidationError;

/// File names probed (in order) by [`discover_config_path`].
pub const CONFIG_FILE_NAMES: [&str; 2] = ["ferry.toml", ".ferry.toml"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
/// Top-level configuration loaded from `ferry.toml`.
///
/// ```toml
/// [logging]
/// level = "debug"
///
/// [migrate]
/// collision_policy = "reject"
/// class_aliases = { "core/session" = "\\Magento\\Framework\\Session\\SessionManager" }
///
/// [layout]
/// areas = { frontend = ["base", "default"] }
/// ```
pub struct FerryConfig {
    /// Global logging settings for Ferry crates.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Settings for the `Mage::` call migration pass.
    #[serde(default)]
    pub migrate: MigrateConfig,

    /// Settings for the layout handle mapper.
    #[serde(default)]
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level for all Ferry crates.
    ///
    /// Either a simple level (`info`, `debug`, ...) or a full `EnvFilter`
    /// directive string such as `ferry.migrate=trace,info`.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file path.
    ///
    /// If the file cannot be opened, file logging is disabled while other sinks
    /// remain active.
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Create the effective `EnvFilter` for Ferry tracing.
    ///
    /// If `RUST_LOG` is set, it is merged into the resulting filter.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

/// What to do when two matched calls in one file ask for the same injected
/// variable name with different types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Keep the type requested last and log a warning.
    #[default]
    LastWins,
    /// Fail the file.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct MigrateConfig {
    #[serde(default)]
    pub collision_policy: CollisionPolicy,

    /// Indent unit for generated constructor code.
    #[serde(default = "MigrateConfig::default_indent")]
    pub indent: String,

    /// Explicit M1 class alias to M2 class mappings, e.g.
    /// `"core/session" = "\\Magento\\Framework\\Session\\SessionManager"`.
    ///
    /// These take precedence over the built-in tables.
    #[serde(default)]
    pub class_aliases: BTreeMap<String, String>,

    /// Extra M1 module prefixes, e.g. `"mymodule" = "Acme\\MyModule"`.
    #[serde(default)]
    pub module_aliases: BTreeMap<String, String>,

    /// File extensions the `migrate` command picks up.
    #[serde(default = "MigrateConfig::default_extensions")]
    pub extensions: Vec<String>,
}

impl MigrateConfig {
    fn default_indent() -> String {
        "    ".to_owned()
    }

    fn default_extensions() -> Vec<String> {
        vec!["php".to_owned(), "phtml".to_owned()]
    }

    /// Returns `true` when `path` has one of the configured extensions
    /// (compared case-insensitively, leading dots ignored).
    pub fn matches_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            collision_policy: CollisionPolicy::default(),
            indent: Self::default_indent(),
            class_aliases: BTreeMap::new(),
            module_aliases: BTreeMap::new(),
            extensions: Self::default_extensions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct LayoutConfig {
    /// M1 design areas and the packages searched for layout XML in each.
    #[serde(default = "LayoutConfig::default_areas")]
    pub areas: BTreeMap<String, Vec<String>>,
}

impl LayoutConfig {
    fn default_areas() -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([
            (
                "adminhtml".to_owned(),
                vec!["default".to_owned(), "enterprise".to_owned()],
            ),
            (
                "frontend".to_owned(),
                vec![
                    "base".to_owned(),
                    "default".to_owned(),
                    "enterprise".to_owned(),
                ],
            ),
        ])
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            areas: Self::default_areas(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ConfigValidationError>),
}

fn join_errors(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep the message but not the source snippet.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl FerryConfig {
    /// Load and validate a config file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    /// Parse and validate a config from TOML text.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: FerryConfig = toml::from_str(text)?;
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }
        Ok(config)
    }
}

/// Find the config file for `root`: the first of [`CONFIG_FILE_NAMES`] that
/// exists there.
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .into_iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Load the config for `root`, falling back to defaults when no file exists.
pub fn load_for_root(root: &Path) -> Result<(FerryConfig, Option<PathBuf>), ConfigError> {
    match discover_config_path(root) {
        Some(path) => {
            let config = FerryConfig::load_from_path(&path)?;
            Ok((config, Some(path)))
        }
        None => Ok((FerryConfig::default(), None)),
    }
}

struct MutexFileMakeWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl<'a> MakeWriter<'a> for MutexFileMakeWriter {
    type Writer = MutexFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        MutexFileWriter {
            guard: self
                .file
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        }
    }
}

struct MutexFileWriter<'a> {
    guard: std::sync::MutexGuard<'a, std::fs::File>,
}

impl Write for MutexFileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.guard.flush()
    }
}

static TRACING_INIT: Once = Once::new();

/// Initializes structured `tracing` logging.
///
/// This function is safe to call multiple times; only the first call installs a
/// global subscriber.
pub fn init_tracing(logging: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = logging.env_filter();

        let file_path = logging.file.clone();
        let file = file_path
            .as_ref()
            .and_then(|path| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .ok()
            })
            .map(|file| Arc::new(Mutex::new(file)));
        let file_open_failed = file_path.is_some() && file.is_none();

        let mut make_writer = BoxMakeWriter::new(io::sink);
        if logging.stderr {
            // `cargo test` only captures output written through the stdlib print macros.
            if cfg!(debug_assertions) {
                make_writer = BoxMakeWriter::new(
                    make_writer.and(tracing_subscriber::fmt::writer::TestWriter::with_stderr),
                );
            } else {
                make_writer = BoxMakeWriter::new(make_writer.and(io::stderr));
            }
        }
        if let Some(file) = file {
            make_writer = BoxMakeWriter::new(make_writer.and(MutexFileMakeWriter { file }));
        }

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if logging.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() && file_open_failed {
            if let Some(path) = file_path.as_ref() {
                tracing::warn!(
                    target: "ferry.config",
                    path = %path.display(),
                    "failed to open log file; file logging disabled"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_uses_defaults() {
        let config = FerryConfig::load_from_str("").unwrap();
        assert_eq!(config, FerryConfig::default());
        assert_eq!(config.migrate.indent, "    ");
        assert_eq!(config.migrate.collision_policy, CollisionPolicy::LastWins);
        assert_eq!(config.migrate.extensions, vec!["php", "phtml"]);
        assert_eq!(
            config.layout.areas.get("frontend").map(Vec::len),
            Some(3)
        );
    }

    #[test]
    fn loads_full_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(
            &path,
            r#"
[logging]
level = "debug"
json = true
stderr = false

[migrate]
collision_policy = "reject"
indent = "\t"
class_aliases = { "core/session" = "\\Magento\\Framework\\Session\\SessionManager" }
module_aliases = { "mymodule" = "Acme\\MyModule" }
extensions = ["php"]

[layout]
areas = { frontend = ["default"] }
"#,
        )
        .unwrap();

        let config = FerryConfig::load_from_path(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert!(!config.logging.stderr);
        assert_eq!(config.migrate.collision_policy, CollisionPolicy::Reject);
        assert_eq!(config.migrate.indent, "\t");
        assert_eq!(
            config.migrate.class_aliases.get("core/session").map(String::as_str),
            Some("\\Magento\\Framework\\Session\\SessionManager")
        );
        assert_eq!(
            config.migrate.module_aliases.get("mymodule").map(String::as_str),
            Some("Acme\\MyModule")
        );
        assert_eq!(config.layout.areas.len(), 1);

        let (discovered, found) = load_for_root(dir.path()).unwrap();
        assert_eq!(found, Some(path));
        assert_eq!(discovered, config);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, found) = load_for_root(dir.path()).unwrap();
        assert_eq!(found, None);
        assert_eq!(config, FerryConfig::default());

        let err = FerryConfig::load_from_path(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FerryConfig::load_from_str("[migrate]\nindnet = \"  \"\n").unwrap_err();
        match err {
            ConfigError::Toml(message) => assert!(message.contains("unknown field"), "{message}"),
            other => panic!("expected toml error, got {other:?}"),
        }

        let err = FerryConfig::load_from_str("[migrate]\ncollision_policy = \"first-wins\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn semantic_errors_are_reported_together() {
        let err = FerryConfig::load_from_str(
            r#"
[migrate]
indent = "x"
class_aliases = { "core/session" = "Magento\\Framework\\Session" }
module_aliases = { "mymodule" = "\\Acme" }
"#,
        )
        .unwrap_err();
        let ConfigError::Invalid(errors) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(matches!(errors[0], ConfigValidationError::IndentNotWhitespace { .. }));
        assert!(matches!(errors[1], ConfigValidationError::ClassAliasNotQualified { .. }));
        assert!(matches!(errors[2], ConfigValidationError::ModuleAliasInvalid { .. }));
    }

    #[test]
    fn extension_matching_ignores_case_and_dots() {
        let mut config = MigrateConfig::default();
        assert!(config.matches_extension(Path::new("a/Data.php")));
        assert!(config.matches_extension(Path::new("view.PHTML")));
        assert!(!config.matches_extension(Path::new("config.xml")));
        assert!(!config.matches_extension(Path::new("Makefile")));

        config.extensions = vec![".inc".to_owned()];
        assert!(config.matches_extension(Path::new("legacy.inc")));
    }

    #[test]
    fn level_directives_are_normalized() {
        assert_eq!(LoggingConfig::normalize_level_directives(" WARNING "), "warn");
        assert_eq!(LoggingConfig::normalize_level_directives(""), "info");
        assert_eq!(
            LoggingConfig::normalize_level_directives("ferry.migrate=trace"),
            "ferry.migrate=trace"
        );
    }

    #[test]
    fn init_tracing_can_be_called_twice() {
        let logging = LoggingConfig {
            stderr: false,
            ..LoggingConfig::default()
        };
        init_tracing(&logging);
        init_tracing(&logging);
        tracing::info!(target: "ferry.config", "still fine");
    }
}
