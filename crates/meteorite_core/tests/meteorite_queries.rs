use meteorite_core::db::open_db_in_memory;
use meteorite_core::{
    MassBucket, Meteorite, MeteoriteRepository, MeteoriteService, PageRequest, SearchParams,
    SqliteMeteoriteRepository,
};
use rusqlite::Connection;

fn record(
    id: i64,
    name: Option<&str>,
    recclass: Option<&str>,
    fall: Option<&str>,
    mass: Option<f64>,
    year: Option<i32>,
) -> Meteorite {
    Meteorite {
        name: name.map(str::to_string),
        recclass: recclass.map(str::to_string),
        fall: fall.map(str::to_string),
        mass,
        year,
        ..Meteorite::with_id(id)
    }
}

fn seeded_conn() -> Connection {
    let conn = open_db_in_memory().unwrap();
    SqliteMeteoriteRepository::new(&conn)
        .insert_all(&[
            record(1, Some("Aachen"), Some("L5"), Some("Fell"), Some(21.0), Some(1880)),
            record(2, Some("Aarhus"), Some("H6"), Some("Fell"), Some(720.0), Some(1951)),
            record(6, Some("Abee"), Some("EH4"), Some("Fell"), Some(107000.0), Some(1952)),
            record(370, Some("Achiras"), Some("L6"), Some("Fell"), Some(780.0), Some(1902)),
            record(398, Some("Aguada"), Some("L6"), Some("Fell"), Some(1620.0), Some(1930)),
            record(424, Some("Aïr"), Some("L6"), Some("Fell"), Some(24000.0), Some(1925)),
            record(425, Some("Aire-sur-la-Lys"), Some("Unknown"), Some("Fell"), None, Some(1769)),
            record(900, None, None, Some("Found"), Some(1000.0), None),
            record(901, Some("Odd_name%"), Some("l6"), Some("Found"), Some(10000.0), Some(1990)),
            record(56729, Some("Österplana 001"), Some("Relict OC"), Some("Found"), Some(6000.0), Some(1988)),
        ])
        .unwrap();
    conn
}

fn all_rows() -> PageRequest {
    PageRequest::new(None, Some(100), None)
}

fn search_ids(conn: &Connection, params: SearchParams) -> Vec<i64> {
    let service = MeteoriteService::new(SqliteMeteoriteRepository::new(conn));
    service
        .search_meteorites(params, &all_rows())
        .unwrap()
        .content
        .iter()
        .map(|record| record.id)
        .collect()
}

#[test]
fn list_without_name_returns_everything() {
    let conn = seeded_conn();
    let service = MeteoriteService::new(SqliteMeteoriteRepository::new(&conn));

    let unfiltered = service.list_meteorites(None, &all_rows()).unwrap();
    assert_eq!(unfiltered.total_elements, 10);

    let blank = service.list_meteorites(Some("   "), &all_rows()).unwrap();
    assert_eq!(blank, unfiltered);
}

#[test]
fn list_name_filter_is_case_insensitive_substring() {
    let conn = seeded_conn();
    let service = MeteoriteService::new(SqliteMeteoriteRepository::new(&conn));

    let page = service.list_meteorites(Some("AA"), &all_rows()).unwrap();
    let ids = page.content.iter().map(|record| record.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2]);

    let page = service.list_meteorites(Some("öster"), &all_rows()).unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].id, 56729);
}

#[test]
fn search_without_filters_matches_unfiltered_list() {
    let conn = seeded_conn();
    let service = MeteoriteService::new(SqliteMeteoriteRepository::new(&conn));
    let request = PageRequest::new(Some(1), Some(4), None);

    let searched = service
        .search_meteorites(SearchParams::default(), &request)
        .unwrap();
    let listed = service.list_meteorites(None, &request).unwrap();
    assert_eq!(searched, listed);
}

#[test]
fn search_recclass_is_case_insensitive_exact() {
    let conn = seeded_conn();
    let upper = search_ids(
        &conn,
        SearchParams {
            recclass: Some("L6".to_string()),
            ..SearchParams::default()
        },
    );
    let lower = search_ids(
        &conn,
        SearchParams {
            recclass: Some("l6".to_string()),
            ..SearchParams::default()
        },
    );

    assert_eq!(upper, vec![370, 398, 424, 901]);
    assert_eq!(upper, lower);

    let partial = search_ids(
        &conn,
        SearchParams {
            recclass: Some("L".to_string()),
            ..SearchParams::default()
        },
    );
    assert!(partial.is_empty());
}

#[test]
fn search_mass_range_is_inclusive_and_excludes_null_mass() {
    let conn = seeded_conn();
    let ids = search_ids(
        &conn,
        SearchParams {
            min_mass: Some(720.0),
            max_mass: Some(1620.0),
            ..SearchParams::default()
        },
    );
    assert_eq!(ids, vec![2, 370, 398, 900]);

    let open_ended = search_ids(
        &conn,
        SearchParams {
            min_mass: Some(0.0),
            ..SearchParams::default()
        },
    );
    assert_eq!(open_ended.len(), 9);
    assert!(!open_ended.contains(&425));
}

#[test]
fn search_name_treats_wildcards_literally() {
    let conn = seeded_conn();
    let ids = search_ids(
        &conn,
        SearchParams {
            name: Some("%".to_string()),
            ..SearchParams::default()
        },
    );
    assert_eq!(ids, vec![901]);

    let underscore = search_ids(
        &conn,
        SearchParams {
            name: Some("d_n".to_string()),
            ..SearchParams::default()
        },
    );
    assert_eq!(underscore, vec![901]);
}

#[test]
fn search_fall_and_year_filters() {
    let conn = seeded_conn();
    let found = search_ids(
        &conn,
        SearchParams {
            fall: Some("FOUND".to_string()),
            ..SearchParams::default()
        },
    );
    assert_eq!(found, vec![900, 901, 56729]);

    let year = search_ids(
        &conn,
        SearchParams {
            year: Some(1880),
            ..SearchParams::default()
        },
    );
    assert_eq!(year, vec![1]);
}

#[test]
fn search_filters_combine_with_and() {
    let conn = seeded_conn();
    let ids = search_ids(
        &conn,
        SearchParams {
            recclass: Some("l6".to_string()),
            fall: Some("fell".to_string()),
            max_mass: Some(2000.0),
            ..SearchParams::default()
        },
    );
    assert_eq!(ids, vec![370, 398]);

    let none = search_ids(
        &conn,
        SearchParams {
            name: Some("Aachen".to_string()),
            year: Some(1951),
            ..SearchParams::default()
        },
    );
    assert!(none.is_empty());
}

#[test]
fn null_name_never_matches_name_filter() {
    let conn = seeded_conn();
    let ids = search_ids(
        &conn,
        SearchParams {
            name: Some("a".to_string()),
            ..SearchParams::default()
        },
    );
    assert!(!ids.contains(&900));
}

#[test]
fn trends_count_non_null_years() {
    let conn = seeded_conn();
    let service = MeteoriteService::new(SqliteMeteoriteRepository::new(&conn));

    let trends = service.meteorite_trends().unwrap();
    assert_eq!(trends.len(), 9);
    assert_eq!(trends.get(&1880), Some(&1));
    assert_eq!(trends.values().sum::<u64>(), 9);
}

#[test]
fn mass_distribution_buckets_sum_to_non_null_mass_count() {
    let conn = seeded_conn();
    let service = MeteoriteService::new(SqliteMeteoriteRepository::new(&conn));

    let distribution = service.mass_distribution().unwrap();
    assert_eq!(distribution.get(MassBucket::UnderOneKg.label()), Some(&3));
    assert_eq!(distribution.get(MassBucket::OneToTenKg.label()), Some(&3));
    assert_eq!(distribution.get(MassBucket::OverTenKg.label()), Some(&3));

    let non_null_mass: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM meteorites WHERE mass IS NOT NULL;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(distribution.values().sum::<u64>(), non_null_mass as u64);
}

#[test]
fn sql_mass_buckets_agree_with_in_memory_bucketing() {
    let masses = [0.0, 0.5, 999.99, 1000.0, 1000.01, 9999.9, 10000.0, 2.5e7];
    let conn = open_db_in_memory().unwrap();
    let records: Vec<Meteorite> = masses
        .iter()
        .zip(1..)
        .map(|(mass, id)| record(id, None, None, None, Some(*mass), None))
        .collect();
    SqliteMeteoriteRepository::new(&conn)
        .insert_all(&records)
        .unwrap();

    let mut expected = std::collections::BTreeMap::new();
    for mass in masses {
        *expected
            .entry(MassBucket::for_mass(mass).label().to_string())
            .or_insert(0_u64) += 1;
    }

    let distribution = MeteoriteService::new(SqliteMeteoriteRepository::new(&conn))
        .mass_distribution()
        .unwrap();
    assert_eq!(distribution, expected);
}

#[test]
fn classification_breakdown_groups_exact_values() {
    let conn = seeded_conn();
    let service = MeteoriteService::new(SqliteMeteoriteRepository::new(&conn));

    let breakdown = service.classification_breakdown().unwrap();
    assert_eq!(breakdown.get("L6"), Some(&3));
    assert_eq!(breakdown.get("l6"), Some(&1));
    assert_eq!(breakdown.get("Relict OC"), Some(&1));
    assert_eq!(breakdown.values().sum::<u64>(), 9);
}

#[test]
fn empty_store_yields_empty_statistics() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMeteoriteRepository::new(&conn);
    assert!(repo.year_counts().unwrap().is_empty());
    assert!(repo.mass_bucket_counts().unwrap().is_empty());
    assert!(repo.class_counts().unwrap().is_empty());
}
