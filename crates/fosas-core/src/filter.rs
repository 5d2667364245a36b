use crate::record::Fosa;

/// Sidebar filter inputs. `search` is stored lowercased; an empty string
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub search: String,
    pub host: Option<String>,
}

impl FilterState {
    pub fn set_search(&mut self, raw: &str) {
        self.search = raw.to_lowercase();
    }
}

/// Case-insensitive substring match of `needle` against title, host, slug,
/// any taxonomy name, or description. Any hit qualifies.
pub fn matches(fosa: &Fosa, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let lowered = needle.to_lowercase();
    let needle = lowered.as_str();

    fosa.title.to_lowercase().contains(needle)
        || fosa.host.to_lowercase().contains(needle)
        || fosa.slug.to_lowercase().contains(needle)
        || fosa
            .taxonomies
            .iter()
            .any(|tax| tax.name.to_lowercase().contains(needle))
        || fosa
            .meta
            .descripcion
            .as_deref()
            .map(|d| d.to_lowercase().contains(needle))
            .unwrap_or(false)
}

/// The visible subset: search match intersected with an exact host match
/// when one is selected. Preserves insertion order, so re-deriving from the
/// same inputs always yields the same list.
pub fn filter_records<'a>(records: &'a [Fosa], state: &FilterState) -> Vec<&'a Fosa> {
    records
        .iter()
        .filter(|fosa| {
            let search_hit = matches(fosa, &state.search);
            let host_hit = match &state.host {
                Some(host) => &fosa.host == host,
                None => true,
            };
            search_hit && host_hit
        })
        .collect()
}

/// Distinct host values across the full loaded set, first-seen order.
/// Feeds the source selector dropdown.
pub fn unique_hosts(records: &[Fosa]) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for fosa in records {
        if !hosts.contains(&fosa.host) {
            hosts.push(fosa.host.clone());
        }
    }
    hosts
}
