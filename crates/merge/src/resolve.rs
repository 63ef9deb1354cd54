use std::cmp::Ordering;

use crate::config::{MergeConfig, MergePolicy};
use crate::model::{Candidate, FieldValue, Reason, Resolution};

/// Resolve one field from every provider's offer, in input order.
///
/// 1. Null offers are dropped; nothing left resolves to `no-data`.
/// 2. With a priority list, the first listed provider holding a value wins.
/// 3. Otherwise the field's policy runs over all remaining offers, including
///    offers from providers that appear in the priority list.
pub fn resolve_field(config: &MergeConfig, field: &str, candidates: &[Candidate]) -> Resolution {
    let present: Vec<&Candidate> = candidates.iter().filter(|c| !c.value.is_null()).collect();

    let Some(first) = present.first() else {
        return Resolution {
            value: FieldValue::Null,
            provider: None,
            reason: Reason::NoData,
        };
    };

    if let Some(priority) = config.priority_for(field) {
        for preferred in priority {
            let hit = present
                .iter()
                .find(|c| c.provider.as_deref() == Some(preferred.as_str()));
            if let Some(c) = hit {
                return winner(c, Reason::ProviderPriority);
            }
        }
    }

    let policy = config.policy_for(field);
    let chosen = match policy {
        MergePolicy::FirstNonNull => *first,
        MergePolicy::MaxNumeric => max_numeric(&present).unwrap_or(*first),
    };
    winner(chosen, Reason::Policy(policy))
}

/// Largest numeric offer; the earliest one wins a tie. `None` when no offer
/// is numeric.
fn max_numeric<'a>(present: &[&'a Candidate]) -> Option<&'a Candidate> {
    let mut best: Option<&'a Candidate> = None;
    for c in present {
        // Skips text and NaN.
        if c.value.numeric_cmp(&c.value).is_none() {
            continue;
        }
        match best {
            Some(top) if c.value.numeric_cmp(&top.value) != Some(Ordering::Greater) => {}
            _ => best = Some(*c),
        }
    }
    best
}

fn winner(c: &Candidate, reason: Reason) -> Resolution {
    Resolution {
        value: c.value.clone(),
        provider: c.provider.clone(),
        reason,
    }
}
