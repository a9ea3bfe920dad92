use clap::{Args, Parser, Subcommand, ValueEnum};
use reaction_core::{ItemCheckPolicy, SwitchPolicy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reaction", about = "Emoji reaction ledger operator tool", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// SQLite database file.
    #[arg(long, global = true, env = "REACTION_DB_PATH", default_value = "reactions.db")]
    pub db: PathBuf,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    #[arg(long, global = true, env = "REACTION_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check core linkage
    Ping,
    /// Register a content item so the ledger accepts reactions to it
    RegisterItem(RegisterItemArgs),
    /// Create zero-count entries for an item
    SeedCounters(SeedCountersArgs),
    /// Show counts for one item, or the full leaderboard
    Counts(CountsArgs),
    /// Submit a reaction as an identity
    React(ReactArgs),
    /// Compare an item's counters with its live records
    Audit(AuditArgs),
}

#[derive(Args, Debug)]
pub struct RegisterItemArgs {
    pub item_id: String,
    #[arg(long, value_enum, default_value = "free")]
    pub tier: TierArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TierArg {
    Free,
    Vip,
}

#[derive(Args, Debug)]
pub struct SeedCountersArgs {
    pub item_id: String,
    /// Emoji names; the built-in catalog when omitted.
    pub emojis: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CountsArgs {
    #[arg(long)]
    pub item_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReactArgs {
    #[arg(long)]
    pub identity: String,
    pub item_id: String,
    pub emoji: String,
    /// Item ids after the first turn this into a bulk submission.
    #[arg(long = "also")]
    pub more_items: Vec<String>,
    #[arg(long, value_enum, default_value = "allow-switch")]
    pub switch: SwitchArg,
    #[arg(long, value_enum, default_value = "optimistic")]
    pub item_check: ItemCheckArg,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    pub item_id: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SwitchArg {
    AllowSwitch,
    Locked,
}

impl From<SwitchArg> for SwitchPolicy {
    fn from(value: SwitchArg) -> Self {
        match value {
            SwitchArg::AllowSwitch => Self::AllowSwitch,
            SwitchArg::Locked => Self::Locked,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ItemCheckArg {
    Strict,
    Optimistic,
    Disabled,
}

impl From<ItemCheckArg> for ItemCheckPolicy {
    fn from(value: ItemCheckArg) -> Self {
        match value {
            ItemCheckArg::Strict => Self::Strict,
            ItemCheckArg::Optimistic => Self::Optimistic,
            ItemCheckArg::Disabled => Self::Disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bulk_react() {
        let cli = Cli::try_parse_from([
            "reaction", "react", "--identity", "u1", "1", "love", "--also", "2", "--also", "3",
        ])
        .unwrap();
        let Command::React(args) = cli.command else {
            panic!("expected react");
        };
        assert_eq!(args.more_items, vec!["2", "3"]);
        assert!(matches!(args.switch, SwitchArg::AllowSwitch));
    }
}
