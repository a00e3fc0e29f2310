use crate::ledger::ActivityLedger;
use subweave_core::InterconnectionRecord;

/// Interaction type written for every community-pair row
pub const MULTI_COMMUNITY_USER: &str = "multi_community_user";

/// Build one row per (user, community pair) for every user active in two
/// or more communities
///
/// Users come out sorted by name and each user's pairs in sorted order,
/// so `community1` always sorts before `community2` and repeated runs over
/// the same data produce identical files.
pub fn build_interconnections(ledger: &ActivityLedger) -> Vec<InterconnectionRecord> {
    let mut records = Vec::new();

    for (user, communities) in ledger.multi_community_users() {
        let interactions = ledger.interactions_for(user);
        let communities: Vec<&String> = communities.iter().collect();

        for i in 0..communities.len() {
            for j in (i + 1)..communities.len() {
                let community1 = communities[i];
                let community2 = communities[j];

                let mut interaction_count = 0u64;
                let mut first_interaction: Option<i64> = None;
                let mut last_interaction: Option<i64> = None;

                for interaction in interactions {
                    if interaction.community != *community1
                        && interaction.community != *community2
                    {
                        continue;
                    }
                    interaction_count += 1;
                    first_interaction = Some(match first_interaction {
                        Some(first) => first.min(interaction.timestamp),
                        None => interaction.timestamp,
                    });
                    last_interaction = Some(match last_interaction {
                        Some(last) => last.max(interaction.timestamp),
                        None => interaction.timestamp,
                    });
                }

                records.push(InterconnectionRecord {
                    user: user.clone(),
                    community1: community1.clone(),
                    community2: community2.clone(),
                    interaction_type: MULTI_COMMUNITY_USER.to_string(),
                    interaction_count,
                    first_interaction,
                    last_interaction,
                });
            }
        }
    }

    records
}
