use reaction_core::db::open_db_in_memory;
use reaction_core::{
    ApiResponse, ApiStatus, IdentityId, InMemoryContentRegistry, ItemCheckPolicy, ItemId,
    LedgerPolicy, ReactionApi, TokenTableIdentityProvider,
};
use rusqlite::Connection;
use serde_json::{json, Value};

fn identities() -> TokenTableIdentityProvider {
    [("token-u1", "u1"), ("token-u2", "u2")]
        .into_iter()
        .map(|(token, raw)| (token.to_string(), IdentityId::parse(raw).unwrap()))
        .collect()
}

fn api<'conn, 'p>(
    conn: &'conn Connection,
    identities: &'p TokenTableIdentityProvider,
) -> ReactionApi<'conn, 'p, TokenTableIdentityProvider, InMemoryContentRegistry> {
    let registry =
        InMemoryContentRegistry::with_items(["1", "2", "3", "42"].map(|raw| ItemId::parse(raw).unwrap()));
    let policy = LedgerPolicy {
        item_check: ItemCheckPolicy::Strict,
        ..LedgerPolicy::default()
    };
    ReactionApi::new(conn, identities, registry, policy)
}

fn body(response: &ApiResponse) -> Value {
    serde_json::to_value(&response.body).unwrap()
}

#[test]
fn react_returns_ok_envelope_with_count() {
    let conn = open_db_in_memory().unwrap();
    let identities = identities();
    let api = api(&conn, &identities);

    let response = api.react(Some("token-u1"), "42", "love");

    assert_eq!(response.status, ApiStatus::Ok);
    assert_eq!(response.status.code(), 200);
    assert_eq!(
        body(&response),
        json!({"ok": true, "count": 1, "outcome": "created"})
    );

    let switched = api.react(Some("token-u1"), "42", "cool");
    assert_eq!(
        body(&switched),
        json!({"ok": true, "count": 1, "outcome": "switched"})
    );
}

#[test]
fn repeated_reaction_maps_to_conflict() {
    let conn = open_db_in_memory().unwrap();
    let identities = identities();
    let api = api(&conn, &identities);
    api.react(Some("token-u1"), "42", "love");

    let response = api.react(Some("token-u1"), "42", "love");

    assert_eq!(response.status.code(), 409);
    assert_eq!(body(&response), json!({"error": "already reacted"}));
}

#[test]
fn missing_or_unknown_credential_is_unauthorized() {
    let conn = open_db_in_memory().unwrap();
    let identities = identities();
    let api = api(&conn, &identities);

    for credential in [None, Some(""), Some("stolen")] {
        let response = api.react(credential, "42", "love");
        assert_eq!(response.status, ApiStatus::Unauthorized);
        let error = body(&response)["error"].as_str().unwrap().to_string();
        assert!(!error.contains("stolen"));
    }

    let counts = api.counts(Some("42"));
    assert_eq!(body(&counts), json!({}));
}

#[test]
fn malformed_fields_are_bad_requests() {
    let conn = open_db_in_memory().unwrap();
    let identities = identities();
    let api = api(&conn, &identities);

    assert_eq!(api.react(Some("token-u1"), "", "love").status.code(), 400);
    assert_eq!(api.react(Some("token-u1"), "42", "").status.code(), 400);
    assert_eq!(api.react(Some("token-u1"), "999", "love").status.code(), 400);
    assert_eq!(
        api.react_bulk::<&str>(Some("token-u1"), &[], "love").status.code(),
        400
    );
}

#[test]
fn bulk_react_lists_per_item_counts() {
    let conn = open_db_in_memory().unwrap();
    let identities = identities();
    let api = api(&conn, &identities);
    api.react(Some("token-u2"), "2", "love");

    let response = api.react_bulk(Some("token-u1"), &["1", "2", "3"], "love");

    assert_eq!(response.status.code(), 200);
    assert_eq!(
        body(&response),
        json!({
            "ok": true,
            "results": [
                {"itemId": "1", "count": 1},
                {"itemId": "2", "count": 2},
                {"itemId": "3", "count": 1},
            ]
        })
    );

    let rejected = api.react_bulk(Some("token-u2"), &["1", "2"], "cool");
    assert_eq!(rejected.status.code(), 409);
}

#[test]
fn counts_for_one_item_and_for_all_items() {
    let conn = open_db_in_memory().unwrap();
    let identities = identities();
    let api = api(&conn, &identities);
    api.react(Some("token-u1"), "42", "love");
    api.react(Some("token-u2"), "42", "love");
    api.react(Some("token-u1"), "1", "cool");

    assert_eq!(body(&api.counts(Some("42"))), json!({"love": 2}));
    assert_eq!(
        body(&api.counts(None)),
        json!([
            {"itemId": "42", "emoji": "love", "count": 2},
            {"itemId": "1", "emoji": "cool", "count": 1},
        ])
    );
    assert_eq!(api.counts(Some(" ")).status.code(), 400);
}

#[test]
fn single_reaction_lookup_returns_entry_or_not_found() {
    let conn = open_db_in_memory().unwrap();
    let identities = identities();
    let api = api(&conn, &identities);
    api.react(Some("token-u1"), "42", "love");

    let found = api.reaction("love", "42");
    assert_eq!(found.status.code(), 200);
    assert_eq!(
        body(&found),
        json!({"emoji": "love", "itemId": "42", "count": 1})
    );

    let missing = api.reaction("cool", "42");
    assert_eq!(missing.status.code(), 404);
    assert_eq!(body(&missing), json!({"error": "reaction not found"}));
}

#[test]
fn health_reports_version() {
    let response = ApiResponse::health();
    assert_eq!(response.status.code(), 200);
    assert_eq!(body(&response)["status"], "ok");
    assert!(body(&response)["version"].as_str().is_some());
}
