use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::FerryConfig;

/// JSON schema for `ferry.toml`.
///
/// Intended for editor tooling (TOML JSON schema integration) and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    let mut schema = schema_for!(FerryConfig);
    schema.schema.metadata().title = Some("ferry.toml".to_owned());
    schema
}
