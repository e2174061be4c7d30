use crate::config::Config;
use crate::db::Store;
use crate::services::Scheduler;

pub async fn cmd_purge_tokens(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let removed = Scheduler::new(store, config.maintenance.clone())
        .run_once()
        .await?;

    println!("✓ Removed {removed} expired token(s).");
    Ok(())
}
