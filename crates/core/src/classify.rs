//! Content-based column classification.
//!
//! A column is judged by its sample alone: the first `sample_rows`
//! non-missing values. Rules run in a fixed priority order because the
//! feature sets overlap (a price-change cell also contains currency,
//! an address also contains digits); first match wins.

use regex::Regex;

use crate::config::Source;
use crate::model::{Column, SemanticColumnType, Table};

/// First `sample_rows` non-missing values of a column.
pub fn column_sample(column: &Column, sample_rows: usize) -> Vec<&str> {
    column
        .cells
        .iter()
        .filter_map(|c| c.as_deref())
        .take(sample_rows)
        .collect()
}

fn any(sample: &[&str], pred: impl Fn(&str) -> bool) -> bool {
    sample.iter().any(|v| pred(v))
}

fn any_match(sample: &[&str], re: &Regex) -> bool {
    sample.iter().any(|v| re.is_match(v))
}

/// Classify one column sample with the given source's vocabulary.
/// An empty (all-missing) sample matches no content rule and falls
/// through to `AdditionalInfo`.
pub fn classify_sample(source: Source, sample: &[&str]) -> SemanticColumnType {
    match source {
        Source::Madlan => classify_madlan(sample),
        Source::Yad2 => classify_yad2(sample),
    }
}

fn classify_madlan(sample: &[&str]) -> SemanticColumnType {
    // Links and images first: URLs trip nearly every later rule.
    if any(sample, |v| v.contains("http")) {
        if any(sample, |v| v.contains("madlan")) {
            return SemanticColumnType::Link;
        }
        let dev_re = Regex::new("developer|agents").unwrap();
        if any_match(sample, &dev_re) {
            return SemanticColumnType::DeveloperLink;
        }
        let img_re = Regex::new("img|image|jpg|png|images2").unwrap();
        if any_match(sample, &img_re) {
            return SemanticColumnType::ImageSrc;
        }
        // Unrecognized URL: fall through to the content rules.
    }

    let addr_re = Regex::new("רחוב|שכונה|דירה|,").unwrap();
    if any_match(sample, &addr_re) {
        return SemanticColumnType::Address;
    }

    let rooms_re = Regex::new(r"\d+(\.\d+)?\s*חדרים").unwrap();
    if any_match(sample, &rooms_re) {
        return SemanticColumnType::Rooms;
    }

    let floor_re = Regex::new("קומה|קרקע|מרתף").unwrap();
    if any_match(sample, &floor_re) {
        return SemanticColumnType::Floor;
    }

    let size_re = Regex::new("מ\"ר|מטר").unwrap();
    if any_match(sample, &size_re) {
        return SemanticColumnType::Size;
    }

    let currency_re = Regex::new("₪|שח|ש\"ח").unwrap();
    if any_match(sample, &currency_re) {
        return SemanticColumnType::Price;
    }

    let project_re = Regex::new("פרויקט|מתחם").unwrap();
    if any_match(sample, &project_re) {
        return SemanticColumnType::ProjectName;
    }

    let exclusive_re = Regex::new("בלעדי|אקסקלוסיבי").unwrap();
    if any_match(sample, &exclusive_re) {
        return SemanticColumnType::Exclusive;
    }

    SemanticColumnType::AdditionalInfo
}

fn classify_yad2(sample: &[&str]) -> SemanticColumnType {
    if any(sample, |v| v.contains("http")) {
        if any(sample, |v| v.contains("yad2")) {
            return SemanticColumnType::Link;
        }
        if any(sample, |v| v.contains("img")) {
            return SemanticColumnType::ImageSrc;
        }
    }

    let currency_re = Regex::new("₪|שח|ש\"ח").unwrap();
    if any_match(sample, &currency_re) {
        // Movement words mean the column tracks price history, not the
        // asking price itself.
        let movement_re = Regex::new("ירד|עלה|עודכן").unwrap();
        if any_match(sample, &movement_re) {
            return SemanticColumnType::PriceChange;
        }
        if any(sample, |v| v.chars().any(|c| c.is_ascii_digit())) {
            return SemanticColumnType::Price;
        }
    }

    let addr_re = Regex::new("רחוב|שכונה|דירה").unwrap();
    if any_match(sample, &addr_re) {
        return SemanticColumnType::Address;
    }

    // Yad2 packs rooms/floor/size into one details blob. Resolve it to
    // the most specific metric the sample shows; embedded extraction
    // later pulls the other metrics out of the same text.
    let details_re = Regex::new("מ\"ר|חדרים|קומה").unwrap();
    if any_match(sample, &details_re) {
        let rooms_re = Regex::new(r"\d+(\.\d+)?\s*חדרים").unwrap();
        if any_match(sample, &rooms_re) {
            return SemanticColumnType::Rooms;
        }
        let floor_re = Regex::new("קומה|קרקע|מרתף").unwrap();
        if any_match(sample, &floor_re) {
            return SemanticColumnType::Floor;
        }
        return SemanticColumnType::Size;
    }

    let publisher_re = Regex::new("תיווך|מתווך|פרטי").unwrap();
    if any_match(sample, &publisher_re) {
        return SemanticColumnType::Publisher;
    }

    let where_re = Regex::new("צפון|דרום|מזרח|מערב|שכונה").unwrap();
    if any_match(sample, &where_re) {
        return SemanticColumnType::Where;
    }

    SemanticColumnType::AdditionalInfo
}

/// Classify every column of a table.
pub fn classify_columns(table: &Table, source: Source, sample_rows: usize) -> Vec<SemanticColumnType> {
    table
        .columns
        .iter()
        .map(|col| classify_sample(source, &column_sample(col, sample_rows)))
        .collect()
}

/// Assign final column names from classified types. Repeated types get a
/// running numeric suffix (`price`, `price_2`, …); the fallback bucket is
/// always numbered (`additional_info_1`, `additional_info_2`, …), so the
/// result is duplicate-free.
pub fn assign_canonical_names(types: &[SemanticColumnType]) -> Vec<String> {
    let mut names = Vec::with_capacity(types.len());
    let mut counts: std::collections::HashMap<SemanticColumnType, usize> = std::collections::HashMap::new();

    for &ty in types {
        let n = counts.entry(ty).or_insert(0);
        *n += 1;
        let base = ty.canonical_name();
        let name = if ty == SemanticColumnType::AdditionalInfo {
            format!("{base}_{n}")
        } else if *n == 1 {
            base.to_string()
        } else {
            format!("{base}_{n}")
        };
        names.push(name);
    }

    names
}
