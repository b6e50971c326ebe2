use std::fs;

use chrono::{Duration, Local};
use critter::{
    creature::{Creature, CreatureSpec},
    store::{Lookup, PersistenceStore, StoreError},
};
use tempfile::tempdir;

fn spec(name: &str) -> CreatureSpec {
    CreatureSpec {
        name: name.into(),
        species: "Cat".into(),
        description: "An elegant cat".into(),
        abilities: vec!["Climbing".into(), "Sneaking".into(), "Catching mice".into()],
        energy: 100,
        hunger: 0,
        mood: 100,
        age: 1,
    }
}

#[test]
fn save_then_load_round_trips_every_field() {
    let dir = tempdir().expect("tempdir");
    let store = PersistenceStore::new(dir.path().join("characters.json"));

    let mut luna = Creature::create(spec("Luna")).unwrap();
    for _ in 0..5 {
        luna.feed();
    }
    luna.pet();
    for _ in 0..3 {
        luna.tick();
    }
    store.save(&luna).unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded, vec![luna]);
}

#[test]
fn dead_creature_round_trips_as_dead() {
    let dir = tempdir().expect("tempdir");
    let store = PersistenceStore::new(dir.path().join("characters.json"));

    let mut spec = spec("Whiskers");
    spec.energy = 1;
    let mut creature = Creature::create(spec).unwrap();
    creature.tick();
    store.save(&creature).unwrap();

    match store.find_by_name("Whiskers").unwrap() {
        Lookup::Found(found) => {
            assert!(!found.is_alive());
            assert_eq!(found.energy(), 0);
        }
        other => panic!("expected a saved creature, got {other:?}"),
    }
}

#[test]
fn second_save_with_same_name_replaces_first() {
    let dir = tempdir().expect("tempdir");
    let store = PersistenceStore::new(dir.path().join("characters.json"));

    let first = Creature::create(spec("Luna")).unwrap();
    let mut second_spec = spec("Luna");
    second_spec.species = "Rabbit".into();
    second_spec.mood = 30;
    let second = Creature::create(second_spec).unwrap();

    store.save(&first).unwrap();
    store.save(&second).unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], second);
}

#[test]
fn never_created_store_loads_empty() {
    let dir = tempdir().expect("tempdir");
    let store = PersistenceStore::new(dir.path().join("missing").join("characters.json"));
    assert!(store.load_all().unwrap().is_empty());
    assert!(store.names().unwrap().is_empty());
}

#[test]
fn malformed_store_surfaces_parse_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("characters.json");
    fs::write(&path, "{ not json").unwrap();

    let err = PersistenceStore::new(&path).load_all().unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }));
    assert!(err.to_string().contains("malformed"));
}

#[test]
fn legacy_store_from_earlier_versions_loads() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("characters.json");
    let created = (Local::now() - Duration::days(10)).naive_local();
    let legacy = format!(
        r#"[
    {{
        "name": "Hoppy",
        "age": 1,
        "species": "Rabbit",
        "description": "A friendly rabbit",
        "energy": 64,
        "hunger": 100,
        "mood": 100,
        "abilities": ["Jumping", "Digging"],
        "alive": true,
        "created_at": "{}",
        "fat_obesity": true
    }}
]"#,
        created.format("%Y-%m-%dT%H:%M:%S%.6f")
    );
    fs::write(&path, legacy).unwrap();

    let store = PersistenceStore::new(&path);
    let hoppy = match store.find_by_name("Hoppy").unwrap() {
        Lookup::Found(found) => found,
        other => panic!("expected Hoppy, got {other:?}"),
    };
    assert!(hoppy.is_alive());
    assert!(hoppy.is_obese());
    assert_eq!(hoppy.overfed_days(), 0);
    assert_eq!(hoppy.remaining_lifespan_days(), 354);

    // Rewriting upgrades the record in place.
    store.save(&hoppy).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"overfed_days\": 0"));
}

fn write_single_record(path: &std::path::Path, energy: u32, hunger: u32, mood: u32) {
    let record = format!(
        r#"[{{"name":"Big","age":1,"species":"Cat","description":"Huge","energy":{energy},"hunger":{hunger},"mood":{mood},"abilities":[],"alive":true,"created_at":"{}","fat_obesity":false}}]"#,
        chrono::Utc::now().to_rfc3339()
    );
    fs::write(path, record).unwrap();
}

#[test]
fn out_of_range_stats_fail_the_load() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("characters.json");
    write_single_record(&path, 250, 150, 400);
    let store = PersistenceStore::new(&path);

    let err = store.find_by_name("Big").unwrap_err();
    assert!(matches!(err, StoreError::Invalid { .. }));
    assert!(err.to_string().contains("energy of 'Big'"));
    assert!(matches!(store.load_all(), Err(StoreError::Invalid { .. })));

    // The bad store is left untouched rather than rewritten.
    let before = fs::read_to_string(&path).unwrap();
    assert!(store.save(&Creature::create(spec("Luna")).unwrap()).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn out_of_range_mood_alone_fails_the_load() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("characters.json");
    write_single_record(&path, 50, 0, 400);

    let err = PersistenceStore::new(&path).load_all().unwrap_err();
    assert!(err.to_string().contains("mood of 'Big'"));
}

#[test]
fn oversized_legacy_hunger_is_capped_and_feeding_is_safe() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("characters.json");
    write_single_record(&path, 50, 4_294_967_290, 40);

    let mut big = match PersistenceStore::new(&path).find_by_name("Big").unwrap() {
        Lookup::Found(found) => found,
        other => panic!("expected Big, got {other:?}"),
    };
    assert_eq!(big.hunger(), 100);
    assert!(big.feed());
    assert_eq!(big.hunger(), 100);
    assert!(big.is_obese());
}
