//! Search-performance report completion.

use pulse_model::{CellValue, NormalizedTable, SEARCH_CTR_COLUMN, SEARCH_FILLED_COLUMNS};

use crate::normalization::{ratio, scale};
use crate::normalize::add_derived_column;

const ORGANIC_IMPRESSIONS: &str = "organicGoogleSearchImpressions";
const ORGANIC_CLICKS: &str = "organicGoogleSearchClicks";

/// Zero-fills absent search metrics and derives or rescales the organic
/// click-through rate to a percentage.
pub fn apply_search_rules(table: &mut NormalizedTable) {
    for name in SEARCH_FILLED_COLUMNS {
        if !table.has_column(name) {
            let zeros = vec![CellValue::Number(0.0); table.height()];
            add_derived_column(table, name, zeros);
        }
    }

    if table.has_column(SEARCH_CTR_COLUMN) {
        table.map_column(SEARCH_CTR_COLUMN, |value| scale(value, 100.0));
        return;
    }

    let total_impressions = table.sum(ORGANIC_IMPRESSIONS).unwrap_or_default();
    let values = if total_impressions > 0.0 {
        let clicks = table.column(ORGANIC_CLICKS).unwrap_or_default();
        let impressions = table.column(ORGANIC_IMPRESSIONS).unwrap_or_default();
        clicks
            .into_iter()
            .zip(impressions)
            .map(|(c, i)| scale(&ratio(&c, &i), 100.0))
            .collect()
    } else {
        vec![CellValue::Number(0.0); table.height()]
    };
    add_derived_column(table, SEARCH_CTR_COLUMN, values);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ctr_from_organic_counts() {
        let mut table = NormalizedTable::from_rows(
            [ORGANIC_IMPRESSIONS, ORGANIC_CLICKS],
            vec![
                vec![CellValue::Number(200.0), CellValue::Number(10.0)],
                vec![CellValue::Number(0.0), CellValue::Number(0.0)],
            ],
        )
        .unwrap();
        apply_search_rules(&mut table);
        assert_eq!(table.value(0, SEARCH_CTR_COLUMN), Some(CellValue::Number(5.0)));
        assert_eq!(table.value(1, SEARCH_CTR_COLUMN), Some(CellValue::Number(0.0)));
        assert_eq!(table.value(0, "organicSearches"), Some(CellValue::Number(0.0)));
    }

    #[test]
    fn vendor_ctr_is_rescaled() {
        let mut table = NormalizedTable::from_rows(
            [SEARCH_CTR_COLUMN],
            vec![vec![CellValue::Number(0.125)]],
        )
        .unwrap();
        apply_search_rules(&mut table);
        assert_eq!(table.value(0, SEARCH_CTR_COLUMN), Some(CellValue::Number(12.5)));
        for name in SEARCH_FILLED_COLUMNS {
            assert!(table.has_column(name));
        }
    }

    #[test]
    fn no_impressions_means_zero_ctr() {
        let mut table = NormalizedTable::from_rows(["clicks"], vec![vec![CellValue::Number(4.0)]])
            .unwrap();
        apply_search_rules(&mut table);
        assert_eq!(table.value(0, SEARCH_CTR_COLUMN), Some(CellValue::Number(0.0)));
    }
}
