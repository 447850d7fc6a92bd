//! End-to-end canonicalization through the engine: caching, single-flight,
//! versioning, failure handling and storage self-healing.

mod common;

use std::sync::Arc;
use std::time::Duration;

use care_cache::config::Config;
use care_cache::transport::DisabledTransport;
use care_cache::CareEngine;
use care_cache_core::models::{CanonicalRecord, RecordKind, DEFAULT_SPIN, DEFAULT_TEMP};
use care_cache_core::normalize::normalize;
use care_cache_core::store::memory::InMemoryStore;
use care_cache_core::store::{storage_key, Namespace};
use care_cache_core::vocab::{Fabric, GarmentType, Program, WashCycle};
use care_cache_core::CareError;

use common::{engine_with, image, text, ScriptedTransport};

const SHIRT: &str = r#"```json
{
  "garmentType": "Button-down shirt",
  "fabric": "100% cotton",
  "color": "navy",
  "washCycle": "Machine wash 40",
  "recommended": {"temp": "40°C", "spin": 1000, "program": "Cotton"},
  "careInstructions": ["Wash inside out", "Do not bleach"],
  "warnings": "Colours may run"
}
```"#;

#[tokio::test]
async fn test_repeat_requests_hit_the_cache() {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(SHIRT));
    let engine = engine_with(Config::default(), store.clone(), transport.clone());

    let first = engine.analyze(&image(3), RecordKind::Garment, "en").await.unwrap();
    let second = engine.analyze(&image(3), RecordKind::Garment, "en").await.unwrap();

    assert_eq!(transport.canonical_calls(), 1);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.canonical).unwrap(),
        serde_json::to_string(&second.canonical).unwrap()
    );

    let CanonicalRecord::Garment(shirt) = &first.canonical else {
        panic!("expected a garment record");
    };
    assert_eq!(shirt.garment_type, GarmentType::Shirt);
    assert_eq!(shirt.fabric, Fabric::Cotton);
    assert_eq!(shirt.wash_cycle, WashCycle::MachineWarm);
    assert_eq!(shirt.recommended.temp, 40);
    assert_eq!(shirt.recommended.spin, 1000);
    assert_eq!(shirt.recommended.program, Program::Cotton);
    assert_eq!(shirt.warnings, vec!["Colours may run".to_string()]);
    assert_eq!(shirt.locale, "en");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_equivalent_text_queries_share_an_entry() {
    let transport = Arc::new(ScriptedTransport::new(r#"{"answer": "Yes, on a wool cycle."}"#));
    let engine = engine_with(
        Config::default(),
        Arc::new(InMemoryStore::new()),
        transport.clone(),
    );

    let a = engine
        .analyze(&text("Can I wash Merino at 30?"), RecordKind::Laundry, "en")
        .await
        .unwrap();
    let b = engine
        .analyze(&text("  can i wash merino at 30 "), RecordKind::Laundry, "en")
        .await
        .unwrap();

    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(transport.canonical_calls(), 1);
}

#[tokio::test]
async fn test_fifty_concurrent_requests_make_one_call() {
    let transport =
        Arc::new(ScriptedTransport::new(SHIRT).with_delay(Duration::from_millis(100)));
    let engine = engine_with(
        Config::default(),
        Arc::new(InMemoryStore::new()),
        transport.clone(),
    );

    let mut handles = Vec::new();
    for _ in 0..50 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.analyze(&image(5), RecordKind::Garment, "en").await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(transport.canonical_calls(), 1);
    assert!(results.iter().all(|r| r == &results[0]));
}

#[tokio::test]
async fn test_kinds_are_cached_separately() {
    let transport = Arc::new(ScriptedTransport::new(SHIRT));
    let engine = engine_with(
        Config::default(),
        Arc::new(InMemoryStore::new()),
        transport.clone(),
    );

    let garment = engine.analyze(&image(7), RecordKind::Garment, "en").await.unwrap();
    let fabric = engine.analyze(&image(7), RecordKind::Fabric, "en").await.unwrap();

    assert_eq!(garment.fingerprint, fabric.fingerprint);
    assert_eq!(garment.canonical.kind(), RecordKind::Garment);
    assert_eq!(fabric.canonical.kind(), RecordKind::Fabric);
    assert_eq!(transport.canonical_calls(), 2);
}

#[tokio::test]
async fn test_version_bump_forces_a_fresh_call() {
    let store = Arc::new(InMemoryStore::new());

    let v1 = Arc::new(ScriptedTransport::new(SHIRT));
    let engine = engine_with(Config::default(), store.clone(), v1.clone());
    let first = engine.analyze(&image(9), RecordKind::Garment, "en").await.unwrap();
    assert_eq!(v1.canonical_calls(), 1);

    let mut config = Config::default();
    config.cache.versions.garment = "v2".to_string();
    let v2 = Arc::new(ScriptedTransport::new(SHIRT));
    let bumped = engine_with(config, store.clone(), v2.clone());
    bumped.analyze(&image(9), RecordKind::Garment, "en").await.unwrap();
    assert_eq!(v2.canonical_calls(), 1);

    let old_key = storage_key(
        Namespace::Record(RecordKind::Garment),
        "v1",
        first.fingerprint.as_str(),
    );
    let new_key = storage_key(
        Namespace::Record(RecordKind::Garment),
        "v2",
        first.fingerprint.as_str(),
    );
    assert!(store.get_raw(&old_key).is_some());
    assert!(store.get_raw(&new_key).is_some());
}

#[tokio::test]
async fn test_unparseable_numbers_fall_back_to_defaults() {
    let transport = Arc::new(ScriptedTransport::new(
        r#"{"fabric":"100% Cotton","recommended":{"temp":"forty"}}"#,
    ));
    let engine = engine_with(
        Config::default(),
        Arc::new(InMemoryStore::new()),
        transport,
    );

    let analysis = engine.analyze(&image(11), RecordKind::Garment, "en").await.unwrap();
    let CanonicalRecord::Garment(g) = analysis.canonical else {
        panic!("expected a garment record");
    };
    assert_eq!(g.fabric, Fabric::Cotton);
    assert_eq!(g.recommended.temp, DEFAULT_TEMP);
    assert_eq!(g.recommended.spin, DEFAULT_SPIN);
    assert!(g.care_instructions.is_empty());
}

#[tokio::test]
async fn test_transport_failure_returns_defaults_without_caching() {
    let store = Arc::new(InMemoryStore::new());
    let engine = CareEngine::new(Config::default(), store.clone(), Arc::new(DisabledTransport));

    let analysis = engine.analyze(&image(13), RecordKind::Stain, "de").await.unwrap();
    assert_eq!(analysis.canonical, normalize(None, RecordKind::Stain));
    assert_eq!(analysis.localized.locale(), "de");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unparseable_reply_is_not_cached() {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new("I could not see a garment, sorry."));
    let engine = engine_with(Config::default(), store.clone(), transport.clone());

    for _ in 0..2 {
        let analysis = engine.analyze(&image(15), RecordKind::Garment, "en").await.unwrap();
        assert_eq!(analysis.canonical, normalize(None, RecordKind::Garment));
    }
    assert_eq!(transport.canonical_calls(), 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_slow_model_times_out_to_defaults() {
    let mut config = Config::default();
    config.model.timeout_secs = 1;
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(SHIRT).with_delay(Duration::from_secs(3)));
    let engine = engine_with(config, store.clone(), transport);

    let analysis = engine.analyze(&image(17), RecordKind::Garment, "en").await.unwrap();
    assert_eq!(analysis.canonical, normalize(None, RecordKind::Garment));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_invalid_input_is_surfaced() {
    let transport = Arc::new(ScriptedTransport::new(SHIRT));
    let engine = engine_with(
        Config::default(),
        Arc::new(InMemoryStore::new()),
        transport.clone(),
    );

    let empty = engine.analyze(&text(" ?! "), RecordKind::Laundry, "en").await;
    assert!(matches!(empty, Err(CareError::InvalidInput(_))));

    let tiny = engine
        .analyze(
            &care_cache_core::Input::ImageBase64("data:image/jpeg;base64,QUJD".to_string()),
            RecordKind::Garment,
            "en",
        )
        .await;
    assert!(matches!(tiny, Err(CareError::InvalidInput(_))));
    assert_eq!(transport.canonical_calls(), 0);
}

#[tokio::test]
async fn test_corrupted_entry_is_replaced() {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(SHIRT));
    let engine = engine_with(Config::default(), store.clone(), transport.clone());

    let fingerprint = engine.fingerprint(&image(19)).unwrap();
    let key = storage_key(
        Namespace::Record(RecordKind::Garment),
        "v1",
        fingerprint.as_str(),
    );
    store.insert_raw(key.clone(), "{\"garmentType\": 12");

    engine.analyze(&image(19), RecordKind::Garment, "en").await.unwrap();
    assert_eq!(transport.canonical_calls(), 1);
    assert!(engine.stats().corrupted >= 1);

    let healed = store.get_raw(&key).unwrap();
    let value: serde_json::Value = serde_json::from_str(&healed).unwrap();
    assert_eq!(value["fabric"], "cotton");
}

#[tokio::test]
async fn test_durable_entries_survive_a_restart() {
    let store = Arc::new(InMemoryStore::new());
    let first = Arc::new(ScriptedTransport::new(SHIRT));
    engine_with(Config::default(), store.clone(), first.clone())
        .analyze(&image(21), RecordKind::Garment, "en")
        .await
        .unwrap();

    let second = Arc::new(ScriptedTransport::new(SHIRT));
    let restarted = engine_with(Config::default(), store, second.clone());
    restarted.analyze(&image(21), RecordKind::Garment, "en").await.unwrap();
    restarted.analyze(&image(21), RecordKind::Garment, "en").await.unwrap();

    assert_eq!(second.canonical_calls(), 0);
    let stats = restarted.stats();
    assert_eq!(stats.durable_hits, 1);
    assert_eq!(stats.local_hits, 1);
}

#[tokio::test]
async fn test_one_cancelled_waiter_does_not_cancel_the_call() {
    let transport =
        Arc::new(ScriptedTransport::new(SHIRT).with_delay(Duration::from_millis(200)));
    let engine = engine_with(
        Config::default(),
        Arc::new(InMemoryStore::new()),
        transport.clone(),
    );

    let spawn = |engine: CareEngine| {
        tokio::spawn(async move { engine.analyze(&image(23), RecordKind::Garment, "en").await })
    };
    let cancelled = spawn(engine.clone());
    let kept = spawn(engine.clone());

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancelled.abort();

    let analysis = kept.await.unwrap().unwrap();
    let CanonicalRecord::Garment(g) = analysis.canonical else {
        panic!("expected a garment record");
    };
    assert_eq!(g.fabric, Fabric::Cotton);
    assert_eq!(transport.canonical_calls(), 1);
    assert_eq!(transport.completed(), 1);
}
