use crate::ledger::ActivityLedger;
use std::collections::BTreeSet;
use subweave_core::CommunityStatsRecord;

/// Round to three decimals, the precision kept in the stats dataset
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Aggregate per-community overlap statistics
///
/// Rows come out in community registration order. A community nobody
/// posted in still gets a row with zero counts.
pub fn build_community_stats(ledger: &ActivityLedger) -> Vec<CommunityStatsRecord> {
    let mut records = Vec::with_capacity(ledger.communities().len());

    for community in ledger.communities() {
        let mut total_users = 0u64;
        let mut multi_users = 0u64;
        let mut connected: BTreeSet<&String> = BTreeSet::new();

        for (_user, communities) in ledger.users() {
            if !communities.contains(community) {
                continue;
            }
            total_users += 1;
            if communities.len() >= 2 {
                multi_users += 1;
                for other in communities {
                    if other != community {
                        connected.insert(other);
                    }
                }
            }
        }

        let interconnection_ratio = if total_users == 0 {
            0.0
        } else {
            round3(multi_users as f64 / total_users as f64)
        };

        let connected_names: Vec<&str> = connected.iter().map(|c| c.as_str()).collect();

        records.push(CommunityStatsRecord {
            community: community.clone(),
            total_users,
            multi_community_users: multi_users,
            interconnection_ratio,
            connected_communities_count: connected.len() as u64,
            connected_communities: connected_names.join(", "),
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_ledger() -> ActivityLedger {
        let mut ledger = ActivityLedger::new();
        ledger.register_community("rust");
        ledger.register_community("programming");
        ledger.register_community("gamedev");

        ledger.register_activity("alice", "rust");
        ledger.register_activity("alice", "programming");
        ledger.register_activity("bob", "rust");
        ledger.register_activity("carol", "programming");
        ledger.register_activity("carol", "gamedev");
        ledger
    }

    #[test]
    fn test_rows_follow_registration_order() {
        let records = build_community_stats(&populated_ledger());
        let names: Vec<&str> = records.iter().map(|r| r.community.as_str()).collect();
        assert_eq!(names, ["rust", "programming", "gamedev"]);
    }

    #[test]
    fn test_user_counts_and_ratio() {
        let records = build_community_stats(&populated_ledger());

        let rust = &records[0];
        assert_eq!(rust.total_users, 2);
        assert_eq!(rust.multi_community_users, 1);
        assert_eq!(rust.interconnection_ratio, 0.5);

        let programming = &records[1];
        assert_eq!(programming.total_users, 2);
        assert_eq!(programming.multi_community_users, 2);
        assert_eq!(programming.interconnection_ratio, 1.0);
    }

    #[test]
    fn test_connected_communities_sorted_and_joined() {
        let records = build_community_stats(&populated_ledger());

        let programming = &records[1];
        assert_eq!(programming.connected_communities_count, 2);
        assert_eq!(programming.connected_communities, "gamedev, rust");
    }

    #[test]
    fn test_empty_community_gets_zero_row() {
        let mut ledger = ActivityLedger::new();
        ledger.register_community("ghosttown");

        let records = build_community_stats(&ledger);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_users, 0);
        assert_eq!(records[0].interconnection_ratio, 0.0);
        assert_eq!(records[0].connected_communities, "");
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(1.0 / 3.0), 0.333);
        assert_eq!(round3(2.0 / 3.0), 0.667);
        assert_eq!(round3(0.5), 0.5);
        assert_eq!(round3(0.0), 0.0);
    }
}
