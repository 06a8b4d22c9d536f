//! Duplicate and proximity detection over a listing collection.
//!
//! Grouping is exact-string on the (normalized) key — no fuzzy matching.
//! Listings with a missing key are excluded from every group, never
//! pooled under an "unknown" bucket.

use std::collections::BTreeMap;

use crate::config::ListingKind;
use crate::model::{AddressGroupRow, ListingCollection, StreetGroupRow};

/// How a street name is derived from an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreetNameMode {
    /// Strip all digit characters and collapse whitespace.
    StripDigits,
    /// Take the substring before the first comma and collapse whitespace.
    BeforeComma,
}

impl StreetNameMode {
    /// Sale scans compare street names with house numbers removed; rental
    /// scans use the pre-comma street segment.
    pub fn for_kind(kind: ListingKind) -> Self {
        match kind {
            ListingKind::Sale => Self::StripDigits,
            ListingKind::Rental => Self::BeforeComma,
        }
    }

    pub fn derive(&self, address: &str) -> Option<String> {
        let base: String = match self {
            Self::StripDigits => address.chars().filter(|c| !c.is_ascii_digit()).collect(),
            Self::BeforeComma => address.split(',').next().unwrap_or(address).to_string(),
        };
        let collapsed = base.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            None
        } else {
            Some(collapsed)
        }
    }
}

/// Listings sharing the exact same address string. Groups with a single
/// member are dropped; output carries one row per member, group-ordered.
pub fn find_same_address(collection: &ListingCollection) -> Vec<AddressGroupRow> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for row in 0..collection.len() {
        if let Some(address) = collection.address(row) {
            groups.entry(address.to_string()).or_default().push(row);
        }
    }

    let mut results = Vec::new();
    for (address, members) in groups {
        if members.len() < 2 {
            continue;
        }
        for row in members {
            results.push(AddressGroupRow {
                address: address.clone(),
                link: collection.link(row).map(|s| s.to_string()),
                price: collection.metrics[row].price,
            });
        }
    }

    results
}

/// Listings whose derived street name coincides. Addresses that yield no
/// street name are skipped.
pub fn find_same_street(collection: &ListingCollection, mode: StreetNameMode) -> Vec<StreetGroupRow> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for row in 0..collection.len() {
        let street = collection.address(row).and_then(|a| mode.derive(a));
        if let Some(street) = street {
            groups.entry(street).or_default().push(row);
        }
    }

    let mut results = Vec::new();
    for (street, members) in groups {
        if members.len() < 2 {
            continue;
        }
        for row in members {
            results.push(StreetGroupRow {
                street: street.clone(),
                address: collection
                    .address(row)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                link: collection.link(row).map(|s| s.to_string()),
                price: collection.metrics[row].price,
            });
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, FieldMap, Indicator, ListingMetrics, Table};

    fn collection(addresses: &[Option<&str>]) -> ListingCollection {
        let table = Table {
            columns: vec![
                Column {
                    name: "link".into(),
                    cells: (0..addresses.len())
                        .map(|i| Some(format!("https://site/item/{i}")))
                        .collect(),
                },
                Column {
                    name: "address".into(),
                    cells: addresses.iter().map(|a| a.map(|s| s.to_string())).collect(),
                },
            ],
        };
        let metrics = (0..addresses.len())
            .map(|i| ListingMetrics {
                price: Some(1000 + i as i64),
                size: None,
                rooms: None,
                price_per_meter: None,
                indicator: Indicator::Regular,
            })
            .collect();
        ListingCollection {
            fields: FieldMap {
                link: Some(0),
                address: Some(1),
                ..FieldMap::default()
            },
            table,
            metrics,
        }
    }

    #[test]
    fn same_address_groups_need_two_members() {
        let c = collection(&[
            Some("הרצל 5, תל אביב"),
            Some("הרצל 5, תל אביב"),
            Some("ביאליק 7, רמת גן"),
        ]);
        let rows = find_same_address(&c);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.address == "הרצל 5, תל אביב"));
        assert!(rows.iter().all(|r| r.price.is_some()));
    }

    #[test]
    fn missing_address_excluded() {
        let c = collection(&[None, None, Some("הרצל 5, תל אביב")]);
        assert!(find_same_address(&c).is_empty());
        assert!(find_same_street(&c, StreetNameMode::StripDigits).is_empty());
    }

    #[test]
    fn strip_digits_groups_same_street() {
        let c = collection(&[Some("הרצל 5, תל אביב"), Some("הרצל 12, תל אביב")]);
        let rows = find_same_street(&c, StreetNameMode::StripDigits);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].street, rows[1].street);
        assert_eq!(rows[0].street, "הרצל , תל אביב");
    }

    #[test]
    fn before_comma_mode() {
        let c = collection(&[
            Some("דיזנגוף 100, תל אביב"),
            Some("דיזנגוף  100, חיפה"),
            Some("אלנבי 3, תל אביב"),
        ]);
        let rows = find_same_street(&c, StreetNameMode::BeforeComma);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].street, "דיזנגוף 100");
    }

    #[test]
    fn whitespace_collapsed_in_derived_name() {
        let mode = StreetNameMode::StripDigits;
        assert_eq!(
            mode.derive("  הרצל   5  "),
            Some("הרצל".to_string())
        );
        assert_eq!(mode.derive("123"), None);
    }

    #[test]
    fn empty_collection_yields_empty_results() {
        let c = ListingCollection::empty();
        assert!(find_same_address(&c).is_empty());
        assert!(find_same_street(&c, StreetNameMode::BeforeComma).is_empty());
    }
}
