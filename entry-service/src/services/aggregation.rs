//! Aggregation engine: per-date totals, name+date attribution and quality grouping.

use crate::models::LedgerEntry;
use crate::services::calculator::{round2, WEIGHT_UNIT};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Sums for a single calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTotals {
    pub total_bags: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_weight: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub total_market_fee: i64,
}

/// Exact calendar-day match; no ranges.
pub fn date_totals(entries: &[LedgerEntry], date: NaiveDate) -> DateTotals {
    entries
        .iter()
        .filter(|e| e.entry_date == date)
        .fold(DateTotals::default(), |mut acc, e| {
            acc.total_bags += i64::from(e.bags);
            acc.total_weight += e.weight;
            acc.total_amount += e.total;
            acc.total_market_fee += i64::from(e.market_fee);
            acc
        })
}

/// ALLAMOUNT attribution: the lowest-id entry of each `(name, day)` group
/// carries the group's summed `total`; every other member carries nothing.
#[derive(Debug, Clone, Default)]
pub struct AllAmounts {
    by_id: HashMap<i64, Decimal>,
}

impl AllAmounts {
    /// One indexing pass over the entries, then one pass over the groups.
    pub fn compute(entries: &[LedgerEntry]) -> Self {
        let mut groups: HashMap<(&str, NaiveDate), (i64, Decimal)> = HashMap::new();

        for entry in entries {
            groups
                .entry((entry.name.as_str(), entry.entry_date))
                .and_modify(|(first_id, sum)| {
                    *first_id = (*first_id).min(entry.id);
                    *sum += entry.total;
                })
                .or_insert((entry.id, entry.total));
        }

        Self {
            by_id: groups.into_values().collect(),
        }
    }

    pub fn get(&self, id: i64) -> Option<Decimal> {
        self.by_id.get(&id).copied()
    }

    /// Σ over groups, equal to Σ `total` over all entries.
    pub fn grand_total(&self) -> Decimal {
        self.by_id.values().copied().sum()
    }
}

/// Amount used by the quality-wise view: `rate × weight / 20` with no less-rate.
/// Kept apart from the stored amount formula on purpose.
pub fn quality_view_amount(rate: Decimal, weight: Decimal) -> Decimal {
    rate * weight / WEIGHT_UNIT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// Not yet marked as settled.
    Available,
    Marked,
}

/// Quality and status filter of the quality-wise view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
}

impl EntryFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        let quality_ok = match self.quality.as_deref().map(str::trim) {
            None | Some("") | Some("all") => true,
            Some(q) => entry.quality == q,
        };
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Available => !entry.is_marked,
            StatusFilter::Marked => entry.is_marked,
        };
        quality_ok && status_ok
    }

    pub fn apply(&self, entries: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}

/// Per-quality sums for the quality-wise summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySummary {
    pub quality: String,
    pub entries: usize,
    pub bags: i64,
    pub weight: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Groups by quality code (sorted), summing at full precision and rounding
/// the output once.
pub fn group_by_quality(entries: &[LedgerEntry]) -> Vec<QualitySummary> {
    let mut groups: BTreeMap<&str, QualitySummary> = BTreeMap::new();

    for entry in entries {
        let summary = groups
            .entry(entry.quality.as_str())
            .or_insert_with(|| QualitySummary {
                quality: entry.quality.clone(),
                entries: 0,
                bags: 0,
                weight: Decimal::ZERO,
                rate: Decimal::ZERO,
                amount: Decimal::ZERO,
            });
        summary.entries += 1;
        summary.bags += i64::from(entry.bags);
        summary.weight += entry.weight;
        summary.rate += entry.rate;
        summary.amount += quality_view_amount(entry.rate, entry.weight);
    }

    groups
        .into_values()
        .map(|mut s| {
            s.weight = round2(s.weight);
            s.rate = round2(s.rate);
            s.amount = round2(s.amount);
            s
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BhartiPair;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn entry(id: i64, name: &str, date: &str, total: Decimal) -> LedgerEntry {
        LedgerEntry {
            id,
            entry_date: date.parse().unwrap(),
            name: name.to_string(),
            bags: 2,
            bharti_pairs: vec![BhartiPair::new(dec!(2), dec!(5))],
            weight: dec!(10.00),
            rate: dec!(100.00),
            lessrate: dec!(10.00),
            amount: dec!(45.00),
            commission: dec!(0.68),
            other_amount: 0,
            total,
            quality: "A".to_string(),
            item: "Wheat".to_string(),
            market_fee: 7,
            is_marked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: "system".to_string(),
            updated_by: "system".to_string(),
        }
    }

    #[test]
    fn first_of_group_carries_group_sum() {
        let entries = vec![
            entry(2, "A", "2024-01-01", dec!(50)),
            entry(1, "A", "2024-01-01", dec!(100)),
            entry(3, "B", "2024-01-02", dec!(75)),
        ];
        let all = AllAmounts::compute(&entries);

        assert_eq!(all.get(1), Some(dec!(150)));
        assert_eq!(all.get(2), None);
        assert_eq!(all.get(3), Some(dec!(75)));
        assert_eq!(all.grand_total(), dec!(225));
    }

    #[test]
    fn same_name_on_different_days_are_separate_groups() {
        let entries = vec![
            entry(1, "A", "2024-01-01", dec!(10)),
            entry(2, "A", "2024-01-02", dec!(20)),
        ];
        let all = AllAmounts::compute(&entries);
        assert_eq!(all.get(1), Some(dec!(10)));
        assert_eq!(all.get(2), Some(dec!(20)));
    }

    #[test]
    fn date_totals_match_exact_day_only() {
        let mut other_day = entry(3, "C", "2024-01-02", dec!(75));
        other_day.bags = 100;
        let entries = vec![
            entry(1, "A", "2024-01-01", dec!(100)),
            entry(2, "B", "2024-01-01", dec!(50.5)),
            other_day,
        ];

        let totals = date_totals(&entries, "2024-01-01".parse().unwrap());
        assert_eq!(totals.total_bags, 4);
        assert_eq!(totals.total_weight, dec!(20.00));
        assert_eq!(totals.total_amount, dec!(150.5));
        assert_eq!(totals.total_market_fee, 14);
    }

    #[test]
    fn date_totals_serialize_as_numbers() {
        let totals = DateTotals {
            total_bags: 4,
            total_weight: dec!(20.50),
            total_amount: dec!(150.5),
            total_market_fee: 14,
        };
        let json = serde_json::to_value(totals).unwrap();
        assert_eq!(json["totalBags"], 4);
        assert_eq!(json["totalWeight"], 20.5);
        assert_eq!(json["totalAmount"], 150.5);
        assert_eq!(json["totalMarketFee"], 14);
    }

    #[test]
    fn quality_amount_ignores_less_rate() {
        let e = entry(1, "A", "2024-01-01", dec!(45.68));
        assert_eq!(quality_view_amount(e.rate, e.weight), dec!(50));
        assert_ne!(quality_view_amount(e.rate, e.weight), e.amount);
    }

    #[test]
    fn filter_by_quality_and_status() {
        let mut marked = entry(1, "A", "2024-01-01", dec!(1));
        marked.is_marked = true;
        let mut other_quality = entry(2, "B", "2024-01-01", dec!(1));
        other_quality.quality = "B".to_string();
        let available = entry(3, "C", "2024-01-01", dec!(1));

        let filter = EntryFilter {
            quality: Some("A".to_string()),
            status: StatusFilter::Available,
        };
        let kept = filter.apply(vec![marked, other_quality, available.clone()]);
        assert_eq!(kept.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3]);

        let lowercase = EntryFilter {
            quality: Some("a".to_string()),
            status: StatusFilter::All,
        };
        assert!(!lowercase.matches(&available));
    }

    #[test]
    fn quality_groups_are_sorted_and_summed() {
        let mut b = entry(2, "B", "2024-01-01", dec!(1));
        b.quality = "B".to_string();
        let entries = vec![b, entry(1, "A", "2024-01-01", dec!(1)), entry(3, "A", "2024-01-02", dec!(1))];

        let groups = group_by_quality(&entries);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].quality, "A");
        assert_eq!(groups[0].entries, 2);
        assert_eq!(groups[0].bags, 4);
        assert_eq!(groups[0].amount, dec!(100.00));
        assert_eq!(groups[1].quality, "B");
    }
}
