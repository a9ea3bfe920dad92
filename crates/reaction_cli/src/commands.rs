use crate::cli::*;
use anyhow::Context;
use log::info;
use reaction_core::db::open_db;
use reaction_core::{
    ContentTier, CounterRepository, EmojiName, IdentityId, ItemId, LedgerPolicy,
    ReactionLedger, SqliteContentRegistry, SqliteCounterRepository, DEFAULT_EMOJI_CATALOG,
};
use rusqlite::Connection;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    if let Some(log_dir) = &cli.log_dir {
        reaction_core::init_logging(log_level(&cli), log_dir)?;
    }

    if let Command::Ping = cli.command {
        println!("reaction_core ping={}", reaction_core::ping());
        println!("reaction_core version={}", reaction_core::core_version());
        return Ok(());
    }

    let conn = open_db(&cli.db).with_context(|| format!("opening {}", cli.db.display()))?;
    let output = run_db_command(&conn, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn log_level(cli: &Cli) -> &str {
    cli.log_level
        .as_deref()
        .unwrap_or_else(|| reaction_core::default_log_level())
}

/// Runs one database-backed command and returns its JSON report.
pub fn run_db_command(conn: &Connection, command: Command) -> anyhow::Result<serde_json::Value> {
    match command {
        Command::Ping => Ok(serde_json::json!({ "ping": reaction_core::ping() })),
        Command::RegisterItem(args) => cmd_register_item(conn, args),
        Command::SeedCounters(args) => cmd_seed_counters(conn, args),
        Command::Counts(args) => cmd_counts(conn, args),
        Command::React(args) => cmd_react(conn, args),
        Command::Audit(args) => cmd_audit(conn, args),
    }
}

fn cmd_register_item(conn: &Connection, args: RegisterItemArgs) -> anyhow::Result<serde_json::Value> {
    let item_id = ItemId::parse(&args.item_id)?;
    let tier = match args.tier {
        TierArg::Free => ContentTier::Free,
        TierArg::Vip => ContentTier::Vip,
    };
    let created = SqliteContentRegistry::new(conn).register_item(&item_id, tier)?;
    Ok(serde_json::json!({ "itemId": item_id, "created": created }))
}

fn cmd_seed_counters(conn: &Connection, args: SeedCountersArgs) -> anyhow::Result<serde_json::Value> {
    let item_id = ItemId::parse(&args.item_id)?;
    let names = if args.emojis.is_empty() {
        DEFAULT_EMOJI_CATALOG.iter().map(|name| name.to_string()).collect()
    } else {
        args.emojis
    };
    let emojis = names
        .iter()
        .map(EmojiName::parse)
        .collect::<Result<Vec<_>, _>>()?;

    let created = SqliteCounterRepository::new(conn).seed_item_counters(&item_id, &emojis)?;
    info!(
        "event=counter_seed module=cli status=ok requested={} created={}",
        emojis.len(),
        created
    );
    Ok(serde_json::json!({ "itemId": item_id, "created": created }))
}

fn cmd_counts(conn: &Connection, args: CountsArgs) -> anyhow::Result<serde_json::Value> {
    let counters = SqliteCounterRepository::new(conn);
    match args.item_id {
        Some(raw) => {
            let item_id = ItemId::parse(raw)?;
            Ok(serde_json::to_value(counters.list_counts(&item_id)?)?)
        }
        None => Ok(serde_json::to_value(counters.list_all_counts()?)?),
    }
}

fn cmd_react(conn: &Connection, args: ReactArgs) -> anyhow::Result<serde_json::Value> {
    let identity_id = IdentityId::parse(&args.identity)?;
    let policy = LedgerPolicy {
        switch: args.switch.into(),
        item_check: args.item_check.into(),
        ..LedgerPolicy::default()
    };
    let ledger = ReactionLedger::new(conn, SqliteContentRegistry::new(conn), policy);

    if args.more_items.is_empty() {
        let outcome = ledger.submit_reaction(&identity_id, &args.item_id, &args.emoji)?;
        return Ok(serde_json::to_value(outcome)?);
    }

    let mut item_ids = vec![args.item_id];
    item_ids.extend(args.more_items);
    let results = ledger.bulk_submit_reaction(&identity_id, &item_ids, &args.emoji)?;
    Ok(serde_json::Value::Array(
        results
            .into_iter()
            .map(|result| {
                serde_json::json!({
                    "itemId": result.item_id,
                    "outcome": result.outcome,
                })
            })
            .collect(),
    ))
}

fn cmd_audit(conn: &Connection, args: AuditArgs) -> anyhow::Result<serde_json::Value> {
    let ledger = ReactionLedger::new(
        conn,
        SqliteContentRegistry::new(conn),
        LedgerPolicy::default(),
    );
    let drifts = ledger.audit_item(&args.item_id)?;
    Ok(serde_json::json!({ "itemId": args.item_id, "drift": drifts }))
}
