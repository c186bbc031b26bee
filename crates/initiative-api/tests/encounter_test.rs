//! Integration tests for the encounter and actor routes over SQLite.

mod common;

use axum::Router;
use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use initiative_core::repository::{EncounterRepository, StoredEncounter};
use initiative_store::SqliteEncounterRepository;
use initiative_test_support::SequenceRng;
use serde_json::{Value, json};
use uuid::Uuid;

async fn create_actor(app: &Router, name: &str, category: &str, modifier: i32) -> String {
    let (status, json) = common::post_json(
        app.clone(),
        "/api/v1/actors",
        &json!({ "name": name, "category": category, "initiative_modifier": modifier }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["id"].as_str().unwrap().to_owned()
}

async fn add(app: &Router, actor_id: &str) -> Value {
    let (status, json) = common::post_json(
        app.clone(),
        "/api/v1/encounter/participants",
        &json!({ "actor_id": actor_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["encounter"].clone()
}

async fn turn(app: &Router, action: &str) -> (StatusCode, Value) {
    common::post_json(
        app.clone(),
        "/api/v1/encounter/turn",
        &json!({ "action": action }),
    )
    .await
}

fn display_names(view: &Value) -> Vec<String> {
    view["participants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["display_name"].as_str().unwrap().to_owned())
        .collect()
}

fn participant_id(view: &Value, display_name: &str) -> String {
    view["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["display_name"] == display_name)
        .unwrap()["participant_id"]
        .as_str()
        .unwrap()
        .to_owned()
}

#[tokio::test]
async fn test_full_combat_flow_survives_save_and_load() {
    // Ada rolls 15, the goblins roll 12 and 9 with offsets of 100 and 50.
    let app = common::build_test_app(
        common::memory_pool().await,
        SequenceRng::new(vec![15, 12, 100, 9, 50]),
    );
    let ada = create_actor(&app, "Ada", "player", 2).await;
    let goblin = create_actor(&app, "Goblin", "monster", 1).await;

    let (status, _) = common::post_json(
        app.clone(),
        "/api/v1/encounter/start",
        &json!({ "title": "Bridge" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    add(&app, &ada).await;
    add(&app, &goblin).await;
    let view = add(&app, &goblin).await;
    assert_eq!(display_names(&view), vec!["Ada", "Goblin 1", "Goblin 2"]);

    let (status, json) = common::post_json(
        app.clone(),
        "/api/v1/encounter/initiative/roll",
        &json!({ "mode": "all" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let view = &json["encounter"];
    assert_eq!(view["round"], 1);
    let initiatives: Vec<&str> = view["participants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["initiative"].as_str().unwrap())
        .collect();
    assert_eq!(initiatives, vec!["17", "12.99", "9.995"]);

    turn(&app, "advance").await;
    let (status, json) = turn(&app, "advance").await;
    assert_eq!(status, StatusCode::OK);
    let goblin_one = participant_id(&json["encounter"], "Goblin 1");
    assert_eq!(
        json["encounter"]["active_participant_id"],
        goblin_one.as_str()
    );
    assert_eq!(json["encounter"]["participants"][0]["completed"], true);

    let (status, json) = common::post_json(app.clone(), "/api/v1/encounter/save", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Bridge 2026-01-15 10:00");
    let (_, json) = common::post_json(app.clone(), "/api/v1/encounter/save", &json!({})).await;
    assert_eq!(json["name"], "Bridge 2026-01-15 10:00 (2)");

    let (status, json) = common::get_json(app.clone(), "/api/v1/encounter/saves").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    common::post_json(
        app.clone(),
        "/api/v1/encounter/start",
        &json!({ "title": "Elsewhere" }),
    )
    .await;
    let (status, view) = common::post_json(
        app.clone(),
        "/api/v1/encounter/load",
        &json!({ "name": "Bridge 2026-01-15 10:00" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["title"], "Bridge");
    assert_eq!(view["round"], 1);
    assert_eq!(view["active_participant_id"], goblin_one.as_str());
    assert_eq!(display_names(&view), vec!["Ada", "Goblin 1", "Goblin 2"]);
    assert_eq!(view["participants"][1]["initiative"], "12.99");
}

#[tokio::test]
async fn test_explicit_save_name_is_never_overwritten() {
    let app = common::build_test_app(common::memory_pool().await, SequenceRng::new(vec![]));

    let (first, _) = common::post_json(
        app.clone(),
        "/api/v1/encounter/save",
        &json!({ "name": "Session 4" }),
    )
    .await;
    let (second, json) = common::post_json(
        app.clone(),
        "/api/v1/encounter/save",
        &json!({ "name": "Session 4" }),
    )
    .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(json["error"], "save_name_taken");
}

#[tokio::test]
async fn test_removed_instance_number_is_not_reused() {
    let app = common::build_test_app(common::memory_pool().await, SequenceRng::new(vec![]));
    let goblin = create_actor(&app, "Goblin", "monster", 0).await;
    add(&app, &goblin).await;
    let view = add(&app, &goblin).await;
    let goblin_one = participant_id(&view, "Goblin 1");

    let (status, _) = common::delete(
        app.clone(),
        &format!("/api/v1/encounter/participants/{goblin_one}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let view = add(&app, &goblin).await;

    assert_eq!(display_names(&view), vec!["Goblin 2", "Goblin 3"]);
}

#[tokio::test]
async fn test_tied_players_can_be_reordered() {
    let app = common::build_test_app(common::memory_pool().await, SequenceRng::new(vec![]));
    let ada = create_actor(&app, "Ada", "player", 0).await;
    let bea = create_actor(&app, "Bea", "player", 0).await;
    add(&app, &ada).await;
    let view = add(&app, &bea).await;
    let ada_id = participant_id(&view, "Ada");
    let bea_id = participant_id(&view, "Bea");
    for id in [&ada_id, &bea_id] {
        let (status, _) = common::put_json(
            app.clone(),
            &format!("/api/v1/encounter/participants/{id}/initiative"),
            &json!({ "value": 15 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = common::post_json(
        app.clone(),
        &format!("/api/v1/encounter/participants/{ada_id}/move"),
        &json!({ "direction": "right" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let view = &json["encounter"];
    assert_eq!(display_names(view), vec!["Bea", "Ada"]);
    assert_eq!(view["participants"][0]["is_tied"], true);
    assert_eq!(view["participants"][1]["is_tied"], true);
}

#[tokio::test]
async fn test_round_advance_and_retreat_restore_progress() {
    let app = common::build_test_app(common::memory_pool().await, SequenceRng::new(vec![]));
    let ada = create_actor(&app, "Ada", "player", 0).await;
    let view = add(&app, &ada).await;
    let ada_id = participant_id(&view, "Ada");
    common::put_json(
        app.clone(),
        &format!("/api/v1/encounter/participants/{ada_id}/initiative"),
        &json!({ "value": 12 }),
    )
    .await;
    common::post_json(
        app.clone(),
        &format!("/api/v1/encounter/participants/{ada_id}/conditions"),
        &json!({ "condition": "poisoned", "remaining_turns": 1 }),
    )
    .await;
    turn(&app, "advance").await;
    let (_, json) = turn(&app, "end").await;
    assert_eq!(json["encounter"]["phase"], "round_complete");

    let (status, json) = turn(&app, "advance_round").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["encounter"]["round"], 2);
    assert_eq!(json["encounter"]["participants"][0]["completed"], false);
    assert_eq!(
        json["encounter"]["participants"][0]["conditions"]
            .as_array()
            .unwrap()
            .len(),
        0
    );

    let (status, json) = turn(&app, "retreat_round").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["encounter"]["round"], 1);
    assert_eq!(json["encounter"]["participants"][0]["completed"], true);
    assert_eq!(
        json["encounter"]["participants"][0]["conditions"][0]["condition"],
        "poisoned"
    );
}

#[tokio::test]
async fn test_load_with_deleted_actor_returns_422_and_keeps_live_encounter() {
    let pool = common::memory_pool().await;
    let app = common::build_test_app(pool.clone(), SequenceRng::new(vec![]));
    let saves = SqliteEncounterRepository::new(pool);
    let payload = json!({
        "encounter_id": Uuid::new_v4(),
        "title": "Orphaned",
        "round": 0,
        "active_participant_id": null,
        "instance_counters": { "Ghost": 1 },
        "participants": [{
            "participant_id": Uuid::new_v4(),
            "actor_id": Uuid::new_v4(),
            "base_name": "Ghost",
            "instance_number": 1,
            "initiative": null,
            "initiative_modifier": 0,
            "has_acted": false,
            "manual_order": 0,
            "insertion_order": 0
        }]
    });
    saves
        .insert(&StoredEncounter {
            name: "Orphaned".to_owned(),
            encounter_id: Uuid::new_v4(),
            payload,
            saved_at: Utc.with_ymd_and_hms(2026, 1, 14, 20, 0, 0).unwrap(),
        })
        .await
        .unwrap();
    common::post_json(
        app.clone(),
        "/api/v1/encounter/start",
        &json!({ "title": "Live" }),
    )
    .await;

    let (status, json) = common::post_json(
        app.clone(),
        "/api/v1/encounter/load",
        &json!({ "name": "Orphaned" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "missing_actor");
    let (_, view) = common::get_json(app, "/api/v1/encounter").await;
    assert_eq!(view["title"], "Live");
}
