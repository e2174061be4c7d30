mod history;
mod purge;

pub use history::cmd_history;
pub use purge::cmd_purge_tokens;
