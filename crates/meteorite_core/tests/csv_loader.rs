use meteorite_core::db::{open_db, open_db_in_memory};
use meteorite_core::{
    load_if_empty, run_startup_load, CsvSource, LoadError, LoadOutcome, LoadPolicy, LoadReport,
    Meteorite, MeteoriteRepository, RepoError, SqliteMeteoriteRepository,
};
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

const HEADER: &str = "name,id,nametype,recclass,mass,fall,year,reclat,reclong";

fn inline(rows: &[&str]) -> CsvSource {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    CsvSource::Inline(text)
}

#[test]
fn loading_into_empty_store_inserts_every_data_row() {
    let mut conn = open_db_in_memory().unwrap();
    let source = inline(&[
        "Aachen,1,Valid,L5,21,Fell,1880,50.775,6.08333",
        "X,2,Valid,H5,,Found,1990,,",
        "Abee,6,Valid,EH4,107000,Fell,1952,54.21667,-113",
    ]);

    let outcome = load_if_empty(&mut conn, &source).unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Loaded(LoadReport {
            inserted: 3,
            skipped_rows: 0
        })
    );

    let repo = SqliteMeteoriteRepository::new(&conn);
    assert_eq!(repo.count().unwrap(), 3);
    assert_eq!(
        repo.get(1).unwrap().unwrap(),
        Meteorite {
            id: 1,
            name: Some("Aachen".to_string()),
            recclass: Some("L5".to_string()),
            fall: Some("Fell".to_string()),
            mass: Some(21.0),
            year: Some(1880),
            reclat: Some(50.775),
            reclong: Some(6.08333),
        }
    );

    let sparse = repo.get(2).unwrap().unwrap();
    assert_eq!(sparse.mass, None);
    assert_eq!(sparse.reclat, None);
    assert_eq!(sparse.reclong, None);
    assert_eq!(sparse.name.as_deref(), Some("X"));
    assert_eq!(sparse.year, Some(1990));
}

#[test]
fn loading_is_a_no_op_when_store_is_populated() {
    let mut conn = open_db_in_memory().unwrap();
    let first = inline(&["Aachen,1,Valid,L5,21,Fell,1880,50.775,6.08333"]);
    load_if_empty(&mut conn, &first).unwrap();

    let second = inline(&[
        "Aarhus,2,Valid,H6,720,Fell,1951,56.18333,10.23333",
        "Abee,6,Valid,EH4,107000,Fell,1952,54.21667,-113",
    ]);
    let outcome = load_if_empty(&mut conn, &second).unwrap();

    assert_eq!(outcome, LoadOutcome::Skipped { existing: 1 });
    let repo = SqliteMeteoriteRepository::new(&conn);
    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.get(2).unwrap().is_none());
}

#[test]
fn repeated_boots_against_same_file_load_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meteorites.db");

    for _ in 0..2 {
        let mut conn = open_db(&path).unwrap();
        run_startup_load(&mut conn, &CsvSource::Bundled, LoadPolicy::FailFast).unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(SqliteMeteoriteRepository::new(&conn).count().unwrap(), 25);
}

#[test]
fn concurrent_boots_against_same_file_load_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meteorites.db");
    let start = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            let start = Arc::clone(&start);
            thread::spawn(move || {
                let mut conn = open_db(&path).unwrap();
                start.wait();
                load_if_empty(&mut conn, &CsvSource::Bundled).unwrap()
            })
        })
        .collect();
    let outcomes: Vec<LoadOutcome> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let loaded = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, LoadOutcome::Loaded(report) if report.inserted == 25))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, LoadOutcome::Skipped { existing: 25 }))
        .count();
    assert_eq!((loaded, skipped), (1, 1), "outcomes: {outcomes:?}");

    let conn = open_db(&path).unwrap();
    assert_eq!(SqliteMeteoriteRepository::new(&conn).count().unwrap(), 25);
}

#[test]
fn duplicate_ids_abort_load_and_leave_store_empty() {
    let mut conn = open_db_in_memory().unwrap();
    let source = inline(&[
        "Aachen,1,Valid,L5,21,Fell,1880,50.775,6.08333",
        "Aachen copy,1,Valid,L5,21,Fell,1880,50.775,6.08333",
    ]);

    let err = load_if_empty(&mut conn, &source).unwrap_err();
    assert!(matches!(err, LoadError::Repo(RepoError::DuplicateId(1))));
    assert_eq!(SqliteMeteoriteRepository::new(&conn).count().unwrap(), 0);
}

#[test]
fn best_effort_policy_swallows_failures() {
    let mut conn = open_db_in_memory().unwrap();
    let missing = CsvSource::File(PathBuf::from("/nonexistent/Meteorite_landings.csv"));

    let outcome = run_startup_load(&mut conn, &missing, LoadPolicy::BestEffort).unwrap();
    assert_eq!(outcome, LoadOutcome::Aborted);
    assert_eq!(SqliteMeteoriteRepository::new(&conn).count().unwrap(), 0);

    // The store is still usable for a later successful load.
    let outcome = run_startup_load(&mut conn, &CsvSource::Bundled, LoadPolicy::BestEffort).unwrap();
    assert!(matches!(outcome, LoadOutcome::Loaded(_)));
}

#[test]
fn fail_fast_policy_propagates_failures() {
    let mut conn = open_db_in_memory().unwrap();
    let missing = CsvSource::File(PathBuf::from("/nonexistent/Meteorite_landings.csv"));

    let err = run_startup_load(&mut conn, &missing, LoadPolicy::FailFast).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn file_source_is_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Meteorite_landings.csv");
    std::fs::write(
        &path,
        format!("{HEADER}\nAarhus,2,Valid,H6,720,Fell,1951,56.18333,10.23333\n"),
    )
    .unwrap();

    let mut conn = open_db_in_memory().unwrap();
    let outcome = load_if_empty(&mut conn, &CsvSource::File(path)).unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Loaded(LoadReport {
            inserted: 1,
            skipped_rows: 0
        })
    );
}

#[test]
fn invalid_utf8_file_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Meteorite_landings.csv");
    let mut bytes = format!("{HEADER}\nA").into_bytes();
    bytes.extend_from_slice(&[0xff, 0xfe]);
    bytes.extend_from_slice(b",1,Valid,L5,21,Fell,1880,0,0\n");
    std::fs::write(&path, bytes).unwrap();

    let mut conn = open_db_in_memory().unwrap();
    let err = load_if_empty(&mut conn, &CsvSource::File(path)).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert_eq!(SqliteMeteoriteRepository::new(&conn).count().unwrap(), 0);
}

#[test]
fn rows_without_id_are_reported_as_skipped() {
    let mut conn = open_db_in_memory().unwrap();
    let source = inline(&[
        "Aachen,1,Valid,L5,21,Fell,1880,50.775,6.08333",
        "Nameless,,Valid,L5,21,Fell,1880,50.775,6.08333",
    ]);

    let outcome = load_if_empty(&mut conn, &source).unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Loaded(LoadReport {
            inserted: 1,
            skipped_rows: 1
        })
    );
}
