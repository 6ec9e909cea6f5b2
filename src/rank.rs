use crate::models::{BatchSummary, NormalizedRecord};

/// Ascending latency, unmeasured records last. Stable, so equal latencies
/// keep their incoming order.
pub fn rank(mut records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    records.sort_by_key(|r| (r.latency.is_none(), r.latency));
    records
}

pub fn summarize(records: &[NormalizedRecord]) -> BatchSummary {
    let fastest = records
        .iter()
        .filter_map(|r| r.latency.map(|latency| (r, latency)))
        .min_by_key(|&(_, latency)| latency);

    BatchSummary {
        total: records.len(),
        responsive: records.iter().filter(|r| r.height.is_some()).count(),
        fastest_url: fastest.map(|(r, _)| r.url.clone()),
        fastest_latency: fastest.map(|(_, latency)| latency),
        tip_height: records.iter().filter_map(|r| r.height).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, height: Option<u64>, latency: Option<u64>) -> NormalizedRecord {
        NormalizedRecord {
            url: url.to_string(),
            height,
            latency,
        }
    }

    fn urls(records: &[NormalizedRecord]) -> Vec<&str> {
        records.iter().map(|r| r.url.as_str()).collect()
    }

    #[test]
    fn test_rank_by_latency_nulls_last() {
        let ranked = rank(vec![
            record("dead", None, None),
            record("slow", Some(10), Some(300)),
            record("fast", Some(10), Some(50)),
        ]);
        assert_eq!(urls(&ranked), vec!["fast", "slow", "dead"]);
    }

    #[test]
    fn test_rank_is_stable() {
        let ranked = rank(vec![
            record("b", Some(1), Some(20)),
            record("x", None, None),
            record("a", Some(1), Some(20)),
            record("y", None, None),
            record("c", Some(1), Some(0)),
        ]);
        assert_eq!(urls(&ranked), vec!["c", "b", "a", "x", "y"]);
    }

    #[test]
    fn test_rank_total_order() {
        let ranked = rank(vec![
            record("1", Some(1), Some(7)),
            record("2", None, None),
            record("3", Some(1), Some(3)),
            record("4", Some(1), Some(u64::MAX)),
            record("5", Some(1), Some(3)),
        ]);
        let seen_null = ranked.iter().position(|r| r.latency.is_none()).unwrap();
        assert!(ranked[seen_null..].iter().all(|r| r.latency.is_none()));
        assert!(ranked[..seen_null]
            .windows(2)
            .all(|w| w[0].latency <= w[1].latency));
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&[
            record("a", Some(100), Some(90)),
            record("b", Some(102), Some(40)),
            record("c", None, None),
        ]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.responsive, 2);
        assert_eq!(summary.fastest_url.as_deref(), Some("b"));
        assert_eq!(summary.fastest_latency, Some(40));
        assert_eq!(summary.tip_height, Some(102));
    }

    #[test]
    fn test_summarize_nothing_responded() {
        let summary = summarize(&[record("a", None, None)]);
        assert_eq!(summary.responsive, 0);
        assert_eq!(summary.fastest_url, None);
        assert_eq!(summary.tip_height, None);
    }
}
