use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A named taxonomy tag attached to a record ("zona" in the UI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub name: String,
}

/// Free-form metadata block of a detail payload. The coordinate fields
/// arrive as single-element lists of numeric strings; anything missing or
/// malformed simply leaves the record off the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub latitud: Vec<String>,
    #[serde(default)]
    pub longitud: Vec<String>,
}

/// One entry of the summary collection. `type` doubles as the category
/// the loader filters on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub host: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u64,
}

/// Body of a detail fetch, before it is joined with the identity fields of
/// its originating summary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FosaDetail {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub taxonomies: Vec<Taxonomy>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A single geolocated record, identified by `(host, kind, id)`.
///
/// Held in memory for the session only; built by [`Fosa::from_parts`] when
/// the loader merges a summary entry with its detail fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fosa {
    pub host: String,
    pub kind: String,
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub taxonomies: Vec<Taxonomy>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Fosa {
    pub fn from_parts(entry: SummaryEntry, detail: FosaDetail) -> Self {
        Self {
            host: entry.host,
            kind: entry.kind,
            id: entry.id,
            title: detail.title,
            slug: detail.slug,
            date: detail.date,
            meta: detail.meta,
            taxonomies: detail.taxonomies,
            media_url: detail.media_url,
            image: detail.image,
        }
    }

    /// Stable key for list/map selection, unique across hosts.
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.host, self.kind, self.id)
    }

    /// `(lat, lon)` parsed from the first element of each coordinate list.
    /// `None` keeps the record in the sidebar but off the map.
    pub fn coordinate(&self) -> Option<(f64, f64)> {
        let lat = self.meta.latitud.first()?.trim().parse::<f64>().ok()?;
        let lon = self.meta.longitud.first()?.trim().parse::<f64>().ok()?;
        Some((lat, lon))
    }

    /// Link back to the original post on the publishing site.
    pub fn permalink(&self) -> String {
        format!("https://{}/?p={}", self.host, self.id)
    }

    /// Publish date as `DD/MM/YYYY`; falls back to the raw string when the
    /// timestamp does not parse.
    pub fn formatted_date(&self) -> String {
        let date = DateTime::parse_from_rfc3339(&self.date)
            .map(|dt| dt.date_naive())
            .or_else(|_| {
                NaiveDateTime::parse_from_str(&self.date, "%Y-%m-%dT%H:%M:%S")
                    .map(|dt| dt.date())
            })
            .or_else(|_| NaiveDate::parse_from_str(&self.date, "%Y-%m-%d"));

        match date {
            Ok(d) => d.format("%d/%m/%Y").to_string(),
            Err(_) => self.date.clone(),
        }
    }

    /// Tag names joined for display ("Zonas: ...").
    pub fn zonas(&self) -> String {
        self.taxonomies
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Image reference for the list view, `media_url` preferred.
    pub fn image_url(&self) -> Option<&str> {
        self.media_url.as_deref().or(self.image.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fosa_with_coords(lat: &[&str], lon: &[&str]) -> Fosa {
        Fosa {
            host: "a.org".to_string(),
            kind: "fosas".to_string(),
            id: 42,
            title: "Foo".to_string(),
            slug: "foo".to_string(),
            date: "2023-05-17T10:30:00".to_string(),
            meta: RecordMeta {
                descripcion: None,
                latitud: lat.iter().map(|s| s.to_string()).collect(),
                longitud: lon.iter().map(|s| s.to_string()).collect(),
            },
            taxonomies: vec![],
            media_url: None,
            image: None,
        }
    }

    #[test]
    fn test_coordinate_parses_first_element() {
        let fosa = fosa_with_coords(&["19.4326", "0.0"], &["-99.1332"]);
        assert_eq!(fosa.coordinate(), Some((19.4326, -99.1332)));
    }

    #[test]
    fn test_coordinate_missing_or_malformed() {
        assert_eq!(fosa_with_coords(&[], &["-99.1"]).coordinate(), None);
        assert_eq!(fosa_with_coords(&["19.4"], &[]).coordinate(), None);
        assert_eq!(fosa_with_coords(&["n/a"], &["-99.1"]).coordinate(), None);
        assert_eq!(fosa_with_coords(&["19.4"], &[""]).coordinate(), None);
    }

    #[test]
    fn test_coordinate_tolerates_whitespace() {
        let fosa = fosa_with_coords(&[" 19.4326 "], &[" -99.1332"]);
        assert_eq!(fosa.coordinate(), Some((19.4326, -99.1332)));
    }

    #[test]
    fn test_permalink_shape() {
        let fosa = fosa_with_coords(&[], &[]);
        assert_eq!(fosa.permalink(), "https://a.org/?p=42");
    }

    #[test]
    fn test_formatted_date() {
        let mut fosa = fosa_with_coords(&[], &[]);
        assert_eq!(fosa.formatted_date(), "17/05/2023");

        fosa.date = "2023-05-17T10:30:00+00:00".to_string();
        assert_eq!(fosa.formatted_date(), "17/05/2023");

        fosa.date = "not a date".to_string();
        assert_eq!(fosa.formatted_date(), "not a date");
    }

    #[test]
    fn test_key_is_composite() {
        let fosa = fosa_with_coords(&[], &[]);
        assert_eq!(fosa.key(), "a.org-fosas-42");
    }

    #[test]
    fn test_image_url_prefers_media_url() {
        let mut fosa = fosa_with_coords(&[], &[]);
        assert_eq!(fosa.image_url(), None);

        fosa.image = Some("https://a.org/i.jpg".to_string());
        assert_eq!(fosa.image_url(), Some("https://a.org/i.jpg"));

        fosa.media_url = Some("https://a.org/m.jpg".to_string());
        assert_eq!(fosa.image_url(), Some("https://a.org/m.jpg"));
    }
}
