use fosas_core::filter::{filter_records, unique_hosts, FilterState};
use fosas_core::record::{Fosa, RecordMeta, Taxonomy};

fn fosa(host: &str, title: &str, lat: Option<&str>, lon: Option<&str>) -> Fosa {
    Fosa {
        host: host.to_string(),
        kind: "fosas".to_string(),
        id: 1,
        title: title.to_string(),
        slug: title.to_lowercase(),
        date: "2024-01-10T00:00:00".to_string(),
        meta: RecordMeta {
            descripcion: None,
            latitud: lat.map(|v| vec![v.to_string()]).unwrap_or_default(),
            longitud: lon.map(|v| vec![v.to_string()]).unwrap_or_default(),
        },
        taxonomies: vec![Taxonomy {
            name: "Norte".to_string(),
        }],
        media_url: None,
        image: None,
    }
}

fn two_records() -> Vec<Fosa> {
    vec![
        fosa("a.org", "Foo", Some("10"), Some("20")),
        fosa("b.org", "Bar", None, Some("20")),
    ]
}

#[test]
fn test_no_filters_lists_both_maps_one() {
    let records = two_records();
    let state = FilterState::default();

    let visible = filter_records(&records, &state);
    assert_eq!(visible.len(), 2);

    // Only the record with a parseable coordinate pair is marker-eligible.
    let markers: Vec<_> = visible.iter().filter(|f| f.coordinate().is_some()).collect();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].title, "Foo");

    // The coordinate-less record stays in the list regardless.
    assert!(visible.iter().any(|f| f.title == "Bar"));
}

#[test]
fn test_search_bar_filters_list_and_map() {
    let records = two_records();
    let mut state = FilterState::default();
    state.set_search("bar");

    let visible = filter_records(&records, &state);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Bar");

    let markers = visible.iter().filter(|f| f.coordinate().is_some()).count();
    assert_eq!(markers, 0);
}

#[test]
fn test_host_selection_with_empty_search() {
    let records = two_records();
    let state = FilterState {
        search: String::new(),
        host: Some("a.org".to_string()),
    };

    let visible = filter_records(&records, &state);
    assert_eq!(visible.len(), 1);
    assert!(visible.iter().all(|f| f.host == "a.org"));
}

#[test]
fn test_search_and_host_intersect() {
    let records = two_records();
    let mut state = FilterState {
        search: String::new(),
        host: Some("a.org".to_string()),
    };
    state.set_search("bar");

    // "bar" only matches the b.org record, which the host filter excludes.
    assert!(filter_records(&records, &state).is_empty());
}

#[test]
fn test_dropdown_options_are_distinct() {
    let mut records = two_records();
    records.push(fosa("a.org", "Baz", None, None));

    assert_eq!(unique_hosts(&records), vec!["a.org", "b.org"]);
}

#[test]
fn test_rederiving_is_idempotent() {
    let records = two_records();
    let mut state = FilterState::default();
    state.set_search("o"); // hits "Foo" by title and "Bar" by host (b.org)

    let first = filter_records(&records, &state);
    let second = filter_records(&records, &state);

    assert_eq!(first, second);
    // Insertion order is preserved in the derived view.
    let titles: Vec<_> = first.iter().map(|f| f.title.as_str()).collect();
    let mut sorted_by_input = titles.clone();
    sorted_by_input.sort_by_key(|t| {
        records
            .iter()
            .position(|f| f.title == *t)
            .unwrap_or(usize::MAX)
    });
    assert_eq!(titles, sorted_by_input);
}
