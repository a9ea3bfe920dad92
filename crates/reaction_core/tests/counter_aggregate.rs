use reaction_core::db::open_db_in_memory;
use reaction_core::{
    CounterEntry, CounterRepository, EmojiName, IdentityId, InMemoryContentRegistry,
    ItemCheckPolicy, ItemId, LedgerPolicy, ReactionLedger, SqliteCounterRepository,
};
use rusqlite::Connection;
use std::collections::BTreeMap;

fn item(raw: &str) -> ItemId {
    ItemId::parse(raw).unwrap()
}

fn emoji(raw: &str) -> EmojiName {
    EmojiName::parse(raw).unwrap()
}

fn react(conn: &Connection, identity_id: &str, item_id: &str, emoji_name: &str) {
    let policy = LedgerPolicy {
        item_check: ItemCheckPolicy::Disabled,
        ..LedgerPolicy::default()
    };
    ReactionLedger::new(conn, InMemoryContentRegistry::new(), policy)
        .submit_reaction(&IdentityId::parse(identity_id).unwrap(), item_id, emoji_name)
        .unwrap();
}

fn entry(item_id: &str, emoji_name: &str, count: u64) -> CounterEntry {
    CounterEntry {
        item_id: item(item_id),
        emoji: emoji(emoji_name),
        count,
    }
}

#[test]
fn list_all_counts_orders_by_count_then_insertion() {
    let conn = open_db_in_memory().unwrap();
    react(&conn, "u1", "7", "cool");
    react(&conn, "u1", "8", "love");
    react(&conn, "u2", "8", "love");
    react(&conn, "u1", "9", "pepelaugh");

    let entries = SqliteCounterRepository::new(&conn).list_all_counts().unwrap();

    assert_eq!(
        entries,
        vec![
            entry("8", "love", 2),
            entry("7", "cool", 1),
            entry("9", "pepelaugh", 1),
        ]
    );
}

#[test]
fn emptied_counters_stay_listed_at_zero() {
    let conn = open_db_in_memory().unwrap();
    react(&conn, "u1", "42", "love");
    react(&conn, "u1", "42", "cool");

    let counters = SqliteCounterRepository::new(&conn);
    let entry_after_switch = counters
        .find_entry(&item("42"), &emoji("love"))
        .unwrap()
        .expect("entry survives at zero");
    assert_eq!(entry_after_switch.count, 0);
    assert_eq!(
        counters.list_all_counts().unwrap().last(),
        Some(&entry("42", "love", 0))
    );
}

#[test]
fn list_counts_maps_emoji_to_count_for_one_item() {
    let conn = open_db_in_memory().unwrap();
    react(&conn, "u1", "42", "love");
    react(&conn, "u2", "42", "love");
    react(&conn, "u3", "42", "cool");
    react(&conn, "u1", "43", "cool");

    let counts = SqliteCounterRepository::new(&conn)
        .list_counts(&item("42"))
        .unwrap();

    let expected = BTreeMap::from([(emoji("cool"), 1), (emoji("love"), 2)]);
    assert_eq!(counts, expected);
}

#[test]
fn seeding_creates_missing_entries_only() {
    let conn = open_db_in_memory().unwrap();
    react(&conn, "u1", "42", "love");

    let counters = SqliteCounterRepository::new(&conn);
    let created = counters
        .seed_item_counters(&item("42"), &[emoji("love"), emoji("cool"), emoji("HYPED")])
        .unwrap();

    assert_eq!(created, 2);
    assert_eq!(counters.get_count(&item("42"), &emoji("love")).unwrap(), 1);
    assert_eq!(
        counters.find_entry(&item("42"), &emoji("cool")).unwrap(),
        Some(entry("42", "cool", 0))
    );

    let created_again = counters
        .seed_item_counters(&item("42"), &[emoji("cool")])
        .unwrap();
    assert_eq!(created_again, 0);
}

#[test]
fn seeded_entries_count_up_from_zero() {
    let conn = open_db_in_memory().unwrap();
    let counters = SqliteCounterRepository::new(&conn);
    counters
        .seed_item_counters(&item("42"), &[emoji("love")])
        .unwrap();

    react(&conn, "u1", "42", "love");

    assert_eq!(counters.get_count(&item("42"), &emoji("love")).unwrap(), 1);
}
