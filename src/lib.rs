use std::sync::Arc;

use log::info;

pub mod builder;
pub mod db;
pub mod diff;
pub mod errors;
pub mod files;
pub mod models;
pub mod platform;
pub mod reader;

pub use builder::sink::{SqlSink, Statements};
pub use builder::SqlBuilder;
pub use diff::{diff, ChangeOp, ChangeSet, DiffEngine, DiffOptions};
pub use errors::DdlError;
pub use models::connections::ConnectionConfig;
pub use models::schema::{Column, Database, ForeignKey, Index, NameCase, Reference, Table};
pub use models::types::{ColumnType, LogicalType};
pub use platform::{Platform, PlatformConfig, PlatformRegistry};
pub use reader::{ModelReader, ReadOutcome, TableFilter};

/// Connects as `config` describes, reads the live schema with the configured
/// platform and closes the connection again.
pub async fn read_live_schema(
    registry: &PlatformRegistry,
    config: &ConnectionConfig,
    filter: &TableFilter,
) -> Result<(Arc<Platform>, ReadOutcome), DdlError> {
    let platform = registry.lookup(&config.platform)?;
    let source = db::connect(config).await?;
    let name = config.schema.clone().unwrap_or_else(|| platform.name().to_string());
    info!("Reading schema {} as {}", name, platform.name());

    let outcome = platform.reader(&*source).read_database(&name, filter).await;
    source.close().await;
    Ok((platform, outcome?))
}
