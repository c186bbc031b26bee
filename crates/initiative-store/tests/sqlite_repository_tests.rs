//! Integration tests for the SQLite repositories.

use chrono::{Duration, TimeZone, Utc};
use initiative_core::error::DomainError;
use initiative_core::library::{ActorCategory, ActorLibrary, LibraryActor};
use initiative_core::repository::{ActorRepository, EncounterRepository, StoredEncounter};
use initiative_store::{SqliteActorRepository, SqliteEncounterRepository, migrate};
use initiative_test_support::library_actor;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

async fn memory_pool() -> SqlitePool {
    // One connection: every connection to `sqlite::memory:` is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}

fn stored(name: &str, minutes: i64) -> StoredEncounter {
    StoredEncounter {
        name: name.to_owned(),
        encounter_id: Uuid::new_v4(),
        payload: serde_json::json!({ "title": name, "round": 3 }),
        saved_at: Utc.with_ymd_and_hms(2026, 3, 7, 19, 0, 0).unwrap() + Duration::minutes(minutes),
    }
}

// --- saved encounters ---

#[tokio::test]
async fn test_insert_and_load_round_trip() {
    let repo = SqliteEncounterRepository::new(memory_pool().await);
    let save = stored("Cave 2026-03-07 19:00", 0);

    repo.insert(&save).await.unwrap();

    let loaded = repo.load(&save.name).await.unwrap().unwrap();
    assert_eq!(loaded, save);
    assert!(repo.exists(&save.name).await.unwrap());
}

#[tokio::test]
async fn test_load_unknown_name_returns_none() {
    let repo = SqliteEncounterRepository::new(memory_pool().await);

    assert!(repo.load("missing").await.unwrap().is_none());
    assert!(!repo.exists("missing").await.unwrap());
}

#[tokio::test]
async fn test_insert_never_overwrites() {
    let repo = SqliteEncounterRepository::new(memory_pool().await);
    let original = stored("Session 4", 0);
    repo.insert(&original).await.unwrap();

    let result = repo.insert(&stored("Session 4", 5)).await;

    assert!(matches!(result, Err(DomainError::SaveNameTaken(name)) if name == "Session 4"));
    let loaded = repo.load("Session 4").await.unwrap().unwrap();
    assert_eq!(loaded.encounter_id, original.encounter_id);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let repo = SqliteEncounterRepository::new(memory_pool().await);
    repo.insert(&stored("early", 0)).await.unwrap();
    repo.insert(&stored("late", 30)).await.unwrap();
    repo.insert(&stored("middle", 10)).await.unwrap();

    let names: Vec<String> = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();

    assert_eq!(names, vec!["late", "middle", "early"]);
}

// --- actor library ---

#[tokio::test]
async fn test_upsert_and_find_actor() {
    let repo = SqliteActorRepository::new(memory_pool().await);
    let goblin = library_actor("Goblin", ActorCategory::Monster, 2);

    repo.upsert(&goblin).await.unwrap();

    assert_eq!(repo.find(goblin.id).await.unwrap(), Some(goblin));
    assert_eq!(repo.find(Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test]
async fn test_upsert_replaces_existing_actor() {
    let repo = SqliteActorRepository::new(memory_pool().await);
    let goblin = library_actor("Goblin", ActorCategory::Monster, 2);
    repo.upsert(&goblin).await.unwrap();

    let renamed = LibraryActor {
        name: "Goblin Boss".to_owned(),
        initiative_modifier: 4,
        ..goblin.clone()
    };
    repo.upsert(&renamed).await.unwrap();

    assert_eq!(repo.find(goblin.id).await.unwrap(), Some(renamed));
}

#[tokio::test]
async fn test_load_catalog_returns_every_actor() {
    let repo = SqliteActorRepository::new(memory_pool().await);
    let ada = library_actor("Ada", ActorCategory::Player, 3);
    let goblin = library_actor("Goblin", ActorCategory::Monster, 2);
    repo.upsert(&ada).await.unwrap();
    repo.upsert(&goblin).await.unwrap();

    let catalog = repo.load_catalog().await.unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.find_actor(ada.id), Some(ada));
    assert_eq!(catalog.find_actor(goblin.id), Some(goblin));
}

#[tokio::test]
async fn test_unknown_category_is_reported_as_invalid_record() {
    let pool = memory_pool().await;
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO actors (id, name, category, initiative_modifier) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind("Lich")
        .bind("dragon")
        .bind(0_i32)
        .execute(&pool)
        .await
        .unwrap();
    let repo = SqliteActorRepository::new(pool);

    let result = repo.find(id).await;

    assert!(matches!(result, Err(DomainError::InvalidRecord(_))));
}
