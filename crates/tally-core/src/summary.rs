//! Dashboard aggregates computed over a window of recent visits.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::visit::VisitRecord;

/// Rows included in [`DashboardSummary::recent`].
pub const RECENT_ROWS: usize = 10;

/// A value together with how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_visits: u64,
    pub unique_visitors: u64,
    pub devices: BTreeMap<String, u64>,
    pub top_country: Option<Ranked>,
    pub top_city: Option<Ranked>,
    pub top_language: Option<Ranked>,
    /// Mean of the nonzero durations, in seconds.
    pub avg_duration: f64,
    pub recent: Vec<VisitRecord>,
}

impl DashboardSummary {
    /// Aggregate `visits`, which are expected newest first.
    pub fn from_visits(visits: &[VisitRecord]) -> Self {
        let unique: HashSet<&str> = visits.iter().map(|v| v.visitor_id.as_str()).collect();

        let mut devices = BTreeMap::new();
        for visit in visits {
            *devices.entry(visit.device_type.clone()).or_insert(0) += 1;
        }

        // Summed as f64: durations are client-supplied and unbounded.
        let durations: Vec<f64> = visits
            .iter()
            .filter(|v| v.duration != 0)
            .map(|v| v.duration as f64)
            .collect();
        let avg_duration = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64
        };

        Self {
            total_visits: visits.len() as u64,
            unique_visitors: unique.len() as u64,
            devices,
            top_country: most_frequent(visits.iter().map(|v| v.country.as_str())),
            top_city: most_frequent(visits.iter().map(|v| v.city.as_str())),
            top_language: most_frequent(visits.iter().map(|v| v.language.as_str())),
            avg_duration,
            recent: visits.iter().take(RECENT_ROWS).cloned().collect(),
        }
    }
}

/// Highest count wins; ties go to the lexicographically smallest value.
fn most_frequent<'a>(values: impl Iterator<Item = &'a str>) -> Option<Ranked> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_val, a_n), (b_val, b_n)| a_n.cmp(b_n).then_with(|| b_val.cmp(a_val)))
        .map(|(value, count)| Ranked {
            value: value.to_string(),
            count,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(id: i64, visitor: &str, country: &str, device: &str, duration: i64) -> VisitRecord {
        VisitRecord {
            id,
            visitor_id: visitor.to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            url: "https://example.com/".to_string(),
            path: "/".to_string(),
            referrer: String::new(),
            user_agent: String::new(),
            screen_width: 0,
            screen_height: 0,
            ip_address: String::new(),
            country: country.to_string(),
            city: "Unknown".to_string(),
            device_type: device.to_string(),
            language: "en-US".to_string(),
            event_type: "page_view".to_string(),
            duration,
            created_at: "2024-01-01 00:00:00".to_string(),
            processed: 0,
        }
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let summary = DashboardSummary::from_visits(&[]);
        assert_eq!(summary.total_visits, 0);
        assert_eq!(summary.unique_visitors, 0);
        assert!(summary.devices.is_empty());
        assert_eq!(summary.top_country, None);
        assert_eq!(summary.avg_duration, 0.0);
        assert!(summary.recent.is_empty());
    }

    #[test]
    fn counts_uniques_devices_and_top_values() {
        let visits = vec![
            visit(4, "a", "DE", "Mobile", 0),
            visit(3, "b", "PL", "Desktop", 30),
            visit(2, "a", "PL", "Mobile", 10),
            visit(1, "c", "DE", "Mobile", 0),
        ];
        let summary = DashboardSummary::from_visits(&visits);

        assert_eq!(summary.total_visits, 4);
        assert_eq!(summary.unique_visitors, 3);
        assert_eq!(summary.devices.get("Mobile"), Some(&3));
        assert_eq!(summary.devices.get("Desktop"), Some(&1));
        // DE and PL tie at two; the smaller value wins.
        assert_eq!(
            summary.top_country,
            Some(Ranked {
                value: "DE".to_string(),
                count: 2
            })
        );
        assert_eq!(summary.top_language.map(|r| r.count), Some(4));
        assert_eq!(summary.avg_duration, 20.0);
    }

    #[test]
    fn extreme_durations_do_not_overflow() {
        let visits = vec![
            visit(2, "a", "DE", "Desktop", i64::MAX),
            visit(1, "b", "DE", "Desktop", i64::MAX),
        ];
        let summary = DashboardSummary::from_visits(&visits);
        assert!(summary.avg_duration > 0.0);
        assert_eq!(summary.avg_duration, i64::MAX as f64);
    }

    #[test]
    fn recent_keeps_input_order_and_caps() {
        let visits: Vec<VisitRecord> = (0..15)
            .rev()
            .map(|id| visit(id, "v", "US", "Desktop", 0))
            .collect();
        let summary = DashboardSummary::from_visits(&visits);
        assert_eq!(summary.recent.len(), RECENT_ROWS);
        assert_eq!(summary.recent[0].id, 14);
        assert_eq!(summary.recent[RECENT_ROWS - 1].id, 5);
    }
}
