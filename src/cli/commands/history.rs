use crate::config::Config;
use crate::db::Store;
use crate::services::validation::normalize_email;

pub async fn cmd_history(config: &Config, email: &str, limit: u64) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.user_repo().get_by_email(&normalize_email(email)).await? else {
        println!("No account with email {email}.");
        return Ok(());
    };

    let entries = store.audit_repo().recent_for_user(user.id, limit).await?;
    if entries.is_empty() {
        println!("No history for {}.", user.email);
        return Ok(());
    }

    println!("Recent activity for {} (last {}):", user.email, entries.len());
    println!("{:-<70}", "");

    for entry in entries {
        println!("• {} - {}", entry.action, entry.details);
        let item = entry
            .related_item_id
            .map_or_else(String::new, |id| format!(" | item {id}"));
        println!("  {}{} | {}", entry.created_at, item, entry.ip_address);
    }

    Ok(())
}
