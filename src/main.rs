use ddlkit::{read_live_schema, ConnectionConfig, PlatformConfig, PlatformRegistry, TableFilter};
use log::warn;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = ConnectionConfig::from_env()?;
    let registry = PlatformRegistry::with_builtins(PlatformConfig::default());

    let (platform, outcome) = read_live_schema(&registry, &config, &TableFilter::all()).await?;
    for error in &outcome.errors {
        warn!("{}", error);
    }
    print!("{}", platform.create_database_sql(&outcome.database)?);

    Ok(())
}
