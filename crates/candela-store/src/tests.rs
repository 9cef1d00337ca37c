//! Store backend tests

use super::*;
use tempfile::tempdir;

fn sample_record(id: FragranceId, name: &str) -> FragranceRecord {
    FragranceRecord::new(id, name)
        .with_supplier("Givaudan")
        .with_flash_point(62.0)
        .with_components(vec![
            CompositionEntry::new("5989-27-5", "d-Limonene", 5.0, 10.0),
            CompositionEntry::new("1222-05-5", "Galaxolide", 1.0, 5.0),
        ])
}

#[tokio::test]
async fn test_memory_store_preserves_insertion_order() {
    let store = InMemoryStore::new();
    store.insert(sample_record(3, "Figuier"));
    store.insert(sample_record(1, "Ambre"));
    store.insert(sample_record(2, "Tilleul"));

    let names: Vec<String> = store
        .list_fragrances()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["Figuier", "Ambre", "Tilleul"]);
}

#[tokio::test]
async fn test_memory_store_upsert_replaces() {
    let store = InMemoryStore::from_records(vec![sample_record(1, "Ambre")]);
    store.insert(FragranceRecord::new(1, "Ambre Delice"));

    assert_eq!(store.len(), 1);
    let fragrances = store.list_fragrances().await.unwrap();
    assert_eq!(fragrances[0].name, "Ambre Delice");
    assert!(store.list_components(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_fragrance_is_an_error() {
    let store = InMemoryStore::new();
    let err = store.list_components(42).await.unwrap_err();
    assert!(matches!(err, StoreError::UnknownFragrance(42)));
}

#[tokio::test]
async fn test_memory_store_remove() {
    let store = InMemoryStore::from_records(vec![sample_record(1, "A"), sample_record(2, "B")]);
    let removed = store.remove(1).unwrap();
    assert_eq!(removed.summary.name, "A");
    assert_eq!(store.len(), 1);
    assert!(store.remove(1).is_none());
}

#[tokio::test]
async fn test_file_store_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::open(dir.path().join("absent.json")).await.unwrap();
    assert!(store.is_empty());
    assert!(store.list_fragrances().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_store_save_and_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let store = JsonFileStore::open(&path).await.unwrap();
    store.insert(sample_record(7, "Verveine"));
    store.save().await.unwrap();
    assert!(path.exists());

    let reopened = JsonFileStore::open(&path).await.unwrap();
    let fragrances = reopened.list_fragrances().await.unwrap();
    assert_eq!(fragrances.len(), 1);
    assert_eq!(fragrances[0].supplier.as_deref(), Some("Givaudan"));
    assert_eq!(fragrances[0].flash_point, Some(62.0));

    let components = reopened.list_components(7).await.unwrap();
    assert_eq!(components.len(), 2);
    assert_eq!(components[0].registry_id, "5989-27-5");
}

#[tokio::test]
async fn test_file_store_reads_historical_component_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    std::fs::write(
        &path,
        r#"{"fragrances":[{"id":1,"name":"Dita","components":[
            {"cas_number":"1222-05-5","nom":"Galaxolide","pourcentage_min":"10","pourcentage_max":"20"}
        ]}]}"#,
    )
    .unwrap();

    let store = JsonFileStore::open(&path).await.unwrap();
    let components = store.list_components(1).await.unwrap();
    assert_eq!(components[0].registry_id, "1222-05-5");
    assert_eq!(components[0].average(), 15.0);
}

#[tokio::test]
async fn test_file_store_reload_discards_unsaved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = JsonFileStore::open(&path).await.unwrap();
    store.insert(sample_record(1, "Saved"));
    store.save().await.unwrap();
    store.insert(sample_record(2, "Unsaved"));
    assert_eq!(store.len(), 2);

    store.reload().await.unwrap();
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_file_store_rejects_bad_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ fragrances: ").unwrap();

    let err = JsonFileStore::open(&path).await.unwrap_err();
    assert!(matches!(err, StoreError::Json(_)));
}
