//! Query-string construction.
//!
//! The API reads list parameters as repeated keys (`tiers=A&tiers=B`), so
//! everything is flattened into `(key, value)` pairs and handed to
//! `RequestBuilder::query`, which emits one pair per element.

use relatiq_common::FilterCriteria;

pub type QueryPairs = Vec<(&'static str, String)>;

/// Parameters shared by `/articles` and `/graph/network`.
pub fn filter_pairs(filters: &FilterCriteria) -> QueryPairs {
    let mut pairs: QueryPairs = vec![("date_range", filters.date_range.as_str().to_string())];
    pairs.extend(filters.tiers.iter().map(|t| ("tiers", t.as_str().to_string())));
    pairs.extend(
        filters
            .statuses
            .iter()
            .map(|s| ("news_status", s.as_str().to_string())),
    );
    pairs.extend(filters.sectors.iter().map(|s| ("sectors", s.clone())));

    let search = filters.entity_search.trim();
    if !search.is_empty() {
        pairs.push(("entity_search", search.to_string()));
    }
    pairs
}

/// Parameters for `/graph/network`: the selected titles (if any) plus filters.
pub fn network_pairs(titles: &[String], filters: &FilterCriteria) -> QueryPairs {
    let mut pairs = title_pairs(titles);
    pairs.extend(filter_pairs(filters));
    pairs
}

pub fn title_pairs(titles: &[String]) -> QueryPairs {
    titles.iter().map(|t| ("article_titles", t.clone())).collect()
}
