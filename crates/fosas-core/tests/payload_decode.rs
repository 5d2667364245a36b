use fosas_core::record::{Fosa, FosaDetail, SummaryEntry};

#[test]
fn test_summary_entry_decodes() {
    let json = r#"[
        {"host": "colectivo-a.org", "type": "fosas", "id": 101},
        {"host": "colectivo-b.org", "type": "noticias", "id": 7}
    ]"#;

    let entries: Vec<SummaryEntry> = serde_json::from_str(json).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].host, "colectivo-a.org");
    assert_eq!(entries[0].kind, "fosas");
    assert_eq!(entries[1].id, 7);
}

#[test]
fn test_detail_decodes_full_payload() {
    let json = r#"{
        "title": "Hallazgo en la sierra",
        "slug": "hallazgo-en-la-sierra",
        "date": "2023-11-02T08:15:00",
        "meta": {
            "descripcion": "Punto reportado por el colectivo.",
            "latitud": ["28.6353"],
            "longitud": ["-106.0889"]
        },
        "taxonomies": [{"name": "Chihuahua"}, {"name": "Sierra"}],
        "media_url": "https://colectivo-a.org/uploads/sierra.jpg"
    }"#;

    let detail: FosaDetail = serde_json::from_str(json).unwrap();
    assert_eq!(detail.title, "Hallazgo en la sierra");
    assert_eq!(detail.meta.latitud, vec!["28.6353"]);
    assert_eq!(detail.taxonomies.len(), 2);
    assert_eq!(detail.image, None);
}

#[test]
fn test_detail_decodes_sparse_payload() {
    // Everything beyond the title is optional in practice.
    let detail: FosaDetail = serde_json::from_str(r#"{"title": "Sin datos"}"#).unwrap();
    assert_eq!(detail.title, "Sin datos");
    assert!(detail.slug.is_empty());
    assert!(detail.meta.latitud.is_empty());
    assert!(detail.taxonomies.is_empty());
}

#[test]
fn test_null_detail_decodes_to_none() {
    let detail: Option<FosaDetail> = serde_json::from_str("null").unwrap();
    assert!(detail.is_none());
}

#[test]
fn test_merge_keeps_identity_from_summary() {
    let entry: SummaryEntry =
        serde_json::from_str(r#"{"host": "colectivo-a.org", "type": "fosas", "id": 101}"#).unwrap();
    let detail: FosaDetail = serde_json::from_str(
        r#"{
            "title": "Hallazgo",
            "slug": "hallazgo",
            "date": "2023-11-02T08:15:00",
            "meta": {"latitud": ["28.6"], "longitud": ["-106.0"]}
        }"#,
    )
    .unwrap();

    let fosa = Fosa::from_parts(entry, detail);
    assert_eq!(fosa.host, "colectivo-a.org");
    assert_eq!(fosa.kind, "fosas");
    assert_eq!(fosa.id, 101);
    assert_eq!(fosa.title, "Hallazgo");
    assert_eq!(fosa.coordinate(), Some((28.6, -106.0)));
    assert_eq!(fosa.permalink(), "https://colectivo-a.org/?p=101");
}
