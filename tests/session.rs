use std::sync::Arc;
use std::time::Duration;

use critter::{
    scheduler::{lock_creature, LifecycleEvent, SchedulerState},
    species::SpeciesCatalog,
    store::{Lookup, PersistenceStore},
    CareOutcome, LoadOutcome, Session,
};
use tempfile::{tempdir, TempDir};

fn session(interval: Duration) -> (TempDir, Session) {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(PersistenceStore::new(dir.path().join("characters.json")));
    (dir, Session::with_store(store, interval, 64))
}

#[tokio::test]
async fn create_saves_and_starts_ticking() {
    let (_dir, mut session) = session(Duration::from_secs(3600));
    let catalog = SpeciesCatalog::builtin();

    let status = session
        .create(catalog.get("cat").unwrap().spec_for("Luna"))
        .await
        .unwrap();
    assert!(status.alive);
    assert!((364..=365).contains(&status.remaining_lifespan_days));
    assert_eq!(session.scheduler_state(), Some(SchedulerState::Running));
    assert!(matches!(session.find_by_name("Luna").unwrap(), Lookup::Found(_)));

    session.shutdown().await;
}

#[tokio::test]
async fn care_without_creature_is_a_no_op() {
    let (_dir, session) = session(Duration::from_secs(3600));
    assert_eq!(session.feed(), CareOutcome::NoCreature);
    assert_eq!(session.pet(), CareOutcome::NoCreature);
    assert!(session.status_text().is_none());
    assert!(session.save().is_err());
}

#[tokio::test]
async fn feed_and_pet_publish_status() {
    let (_dir, mut session) = session(Duration::from_secs(3600));
    let mut rx = session.subscribe();
    let catalog = SpeciesCatalog::builtin();
    session
        .create(catalog.get("rabbit").unwrap().spec_for("Hoppy"))
        .await
        .unwrap();

    assert_eq!(session.feed(), CareOutcome::Applied);
    assert_eq!(session.pet(), CareOutcome::Applied);

    let mut hungers = Vec::new();
    while let Ok(LifecycleEvent::Status(status)) = rx.try_recv() {
        hungers.push(status.hunger);
    }
    assert_eq!(hungers, vec![20, 20]);

    let text = session.status_text().unwrap();
    assert!(text.contains("Hunger: 20/100"));
    assert!(text.contains("Mood: 100/100"));
    session.shutdown().await;
}

#[tokio::test]
async fn switching_creatures_stops_the_previous_scheduler() {
    let (_dir, mut session) = session(Duration::from_millis(1));
    let catalog = SpeciesCatalog::builtin();

    session
        .create(catalog.get("rabbit").unwrap().spec_for("Hoppy"))
        .await
        .unwrap();
    let hoppy = session.active_creature().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    session
        .create(catalog.get("cat").unwrap().spec_for("Luna"))
        .await
        .unwrap();
    let frozen = lock_creature(&hoppy).energy();
    assert!(frozen < 100);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(lock_creature(&hoppy).energy(), frozen);
    assert!(lock_creature(&session.active_creature().unwrap()).energy() < 100);

    session.shutdown().await;
}

#[tokio::test]
async fn load_reports_missing_and_empty_separately() {
    let (_dir, mut session) = session(Duration::from_secs(3600));
    assert_eq!(session.load("Luna").await.unwrap(), LoadOutcome::StoreEmpty);

    let catalog = SpeciesCatalog::builtin();
    session
        .create(catalog.get("cat").unwrap().spec_for("Luna"))
        .await
        .unwrap();
    assert_eq!(session.load("Rex").await.unwrap(), LoadOutcome::NotFound);
    assert_eq!(
        session.status().map(|status| status.name),
        Some("Luna".to_string())
    );

    session.feed();
    session.save().unwrap();
    match session.load("Luna").await.unwrap() {
        LoadOutcome::Loaded(status) => assert_eq!(status.hunger, 20),
        other => panic!("expected Luna, got {other:?}"),
    }
    session.shutdown().await;
}

#[tokio::test]
async fn dead_creature_loads_without_scheduler_and_ignores_care() {
    let (_dir, mut session) = session(Duration::ZERO);
    let mut rx = session.subscribe();
    let mut spec = SpeciesCatalog::builtin()
        .get("rabbit")
        .unwrap()
        .spec_for("Hoppy");
    spec.energy = 2;
    session.create(spec).await.unwrap();

    loop {
        if let LifecycleEvent::Died { .. } = rx.recv().await.expect("event") {
            break;
        }
    }
    assert_eq!(session.feed(), CareOutcome::Ignored);
    assert_eq!(session.pet(), CareOutcome::Ignored);

    match session.load("Hoppy").await.unwrap() {
        LoadOutcome::Loaded(status) => {
            assert!(!status.alive);
            assert_eq!(status.energy, 0);
        }
        other => panic!("expected Hoppy, got {other:?}"),
    }
    assert_eq!(session.scheduler_state(), None);
    assert_eq!(session.feed(), CareOutcome::Ignored);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn recreating_a_dying_namesake_keeps_the_new_record() {
    let (_dir, mut session) = session(Duration::ZERO);
    let preset = SpeciesCatalog::builtin().get("rabbit").unwrap().clone();

    for _ in 0..20 {
        let mut dying = preset.spec_for("Hoppy");
        dying.energy = 1;
        session.create(dying).await.unwrap();

        let mut fresh = preset.spec_for("Hoppy");
        fresh.energy = 100;
        fresh.mood = 42;
        session.create(fresh).await.unwrap();

        match session.find_by_name("Hoppy").unwrap() {
            Lookup::Found(saved) => assert_eq!(saved.mood(), 42),
            other => panic!("expected Hoppy, got {other:?}"),
        }
        assert_eq!(session.saved_names().unwrap(), vec!["Hoppy"]);
    }
    session.shutdown().await;
}
