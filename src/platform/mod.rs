pub mod builtins;
pub mod dialect;
pub mod typemap;

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::builder::sink::{SqlSink, Statements};
use crate::builder::SqlBuilder;
use crate::db::MetadataSource;
use crate::diff::{ChangeSet, DiffEngine, DiffOptions};
use crate::errors::DdlError;
use crate::models::schema::{Database, NameCase};
use crate::reader::ModelReader;

pub use dialect::{Dialect, QuoteStyle};
pub use typemap::TypeMap;

/// Settings a caller may change on top of a dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Quote every identifier; when off, names are written as given.
    pub delimited_identifiers: bool,
    /// Compare table and column names exactly instead of folding case.
    pub case_sensitive: bool,
    /// Overrides the dialect's identifier length limit.
    pub max_identifier_length: Option<usize>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            delimited_identifiers: true,
            case_sensitive: false,
            max_identifier_length: None,
        }
    }
}

/// One addressable dialect: its capability record plus the configuration it was built with.
#[derive(Debug, Clone)]
pub struct Platform {
    dialect: Dialect,
    config: PlatformConfig,
}

impl Platform {
    pub fn new(dialect: Dialect, config: PlatformConfig) -> Self {
        Self { dialect, config }
    }

    pub fn name(&self) -> &'static str {
        self.dialect.name
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn name_case(&self) -> NameCase {
        if self.config.case_sensitive {
            NameCase::Sensitive
        } else {
            NameCase::Insensitive
        }
    }

    pub fn max_identifier_length(&self) -> usize {
        self.config
            .max_identifier_length
            .unwrap_or(self.dialect.max_identifier_length)
    }

    pub fn quote_identifier(&self, name: &str) -> String {
        if !self.config.delimited_identifiers {
            return name.to_string();
        }
        let quote = match self.dialect.quote {
            QuoteStyle::DoubleQuote => '"',
            QuoteStyle::Backtick => '`',
        };
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(quote);
        for c in name.chars() {
            if c == quote {
                quoted.push(quote);
            }
            quoted.push(c);
        }
        quoted.push(quote);
        quoted
    }

    /// Validates `database` with this platform's name rules.
    pub fn validate(&self, database: &Database) -> Result<(), DdlError> {
        database.validate_with(self.name_case())
    }

    pub fn builder<'a>(&'a self, sink: &'a mut dyn SqlSink) -> SqlBuilder<'a> {
        SqlBuilder::new(self, sink)
    }

    pub fn reader<'a>(&'a self, source: &'a dyn MetadataSource) -> ModelReader<'a> {
        ModelReader::new(self, source)
    }

    /// Diffs two models using this platform's type map, case rules and foreign key placement.
    pub fn diff(&self, current: &Database, desired: &Database) -> Result<ChangeSet, DdlError> {
        DiffEngine::new(DiffOptions::for_platform(self)).diff(current, desired)
    }

    /// Full DDL script that creates every table of `database`.
    pub fn create_database_sql(&self, database: &Database) -> Result<String, DdlError> {
        self.validate(database)?;
        let mut sql = String::new();
        self.builder(&mut sql).create_tables(database)?;
        Ok(sql)
    }

    /// Statements, without terminators, that migrate `current` to `desired`.
    pub fn migration_statements(
        &self,
        current: &Database,
        desired: &Database,
    ) -> Result<Vec<String>, DdlError> {
        let changes = self.diff(current, desired)?;
        let mut statements = Statements::default();
        self.builder(&mut statements).process_changes(&changes)?;
        Ok(statements.into_vec())
    }
}

/// Platforms addressable by name. Built once and passed to whoever needs a lookup.
#[derive(Debug, Default, Clone)]
pub struct PlatformRegistry {
    platforms: HashMap<String, Arc<Platform>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in dialect, all sharing `config`.
    pub fn with_builtins(config: PlatformConfig) -> Self {
        let mut registry = Self::new();
        for dialect in [
            builtins::postgresql(),
            builtins::mysql(),
            builtins::sqlite(),
            builtins::oracle8(),
            builtins::oracle9(),
            builtins::oracle10(),
            builtins::sapdb(),
            builtins::maxdb(),
        ] {
            registry.register(dialect.name, Platform::new(dialect, config.clone()));
        }
        registry.alias("postgres", "postgresql");
        registry.alias("mariadb", "mysql");
        registry
    }

    /// Registers `platform` under `name`, replacing an earlier entry.
    pub fn register(&mut self, name: &str, platform: Platform) -> Arc<Platform> {
        let platform = Arc::new(platform);
        debug!("Registering platform {} as {}", platform.name(), name);
        self.platforms
            .insert(name.to_ascii_lowercase(), Arc::clone(&platform));
        platform
    }

    fn alias(&mut self, alias: &str, target: &str) {
        if let Some(platform) = self.platforms.get(target).cloned() {
            self.platforms.insert(alias.to_string(), platform);
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Platform>, DdlError> {
        self.platforms
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| DdlError::UnknownPlatform(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.platforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive_and_knows_aliases() {
        let registry = PlatformRegistry::with_builtins(PlatformConfig::default());
        assert_eq!(registry.lookup("PostgreSQL").unwrap().name(), "postgresql");
        assert_eq!(registry.lookup("postgres").unwrap().name(), "postgresql");
        assert_eq!(registry.lookup("mariadb").unwrap().name(), "mysql");
        assert_eq!(registry.lookup("Oracle10").unwrap().name(), "oracle10");
        assert!(registry.names().contains(&"maxdb"));
    }

    #[test]
    fn test_unknown_platform() {
        let registry = PlatformRegistry::with_builtins(PlatformConfig::default());
        match registry.lookup("db2") {
            Err(DdlError::UnknownPlatform(name)) => assert_eq!(name, "db2"),
            other => panic!("unexpected lookup result: {:?}", other),
        }
        assert!(PlatformRegistry::new().lookup("postgresql").is_err());
    }

    #[test]
    fn test_quote_identifier() {
        let registry = PlatformRegistry::with_builtins(PlatformConfig::default());
        let pg = registry.lookup("postgresql").unwrap();
        assert_eq!(pg.quote_identifier("USERS"), "\"USERS\"");
        assert_eq!(pg.quote_identifier("a\"b"), "\"a\"\"b\"");
        let mysql = registry.lookup("mysql").unwrap();
        assert_eq!(mysql.quote_identifier("users"), "`users`");

        let plain = Platform::new(
            builtins::postgresql(),
            PlatformConfig {
                delimited_identifiers: false,
                ..PlatformConfig::default()
            },
        );
        assert_eq!(plain.quote_identifier("USERS"), "USERS");
    }

    #[test]
    fn test_config_overrides_identifier_length() {
        let platform = Platform::new(
            builtins::oracle10(),
            PlatformConfig {
                max_identifier_length: Some(18),
                ..PlatformConfig::default()
            },
        );
        assert_eq!(platform.max_identifier_length(), 18);
        assert_eq!(
            Platform::new(builtins::oracle10(), PlatformConfig::default()).max_identifier_length(),
            30
        );

        let config: PlatformConfig = serde_json::from_str(r#"{"case_sensitive": true}"#).unwrap();
        assert!(config.delimited_identifiers);
        assert_eq!(Platform::new(builtins::sqlite(), config).name_case(), NameCase::Sensitive);
    }
}
