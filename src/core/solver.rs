use tracing::debug;

use super::gift::calculate_cash_gift_simulation;
use super::tables::saturating_sum;
use super::types::{GiftRecipient, HouseholdComposition, SpouseMode};

const MAX_ITERATIONS: u32 = 3;
const COARSE_STEP: i64 = 100;
const FINE_STEP: i64 = 10;
const FINE_RADIUS: i64 = 100;
/// Per-person annual ceiling searched by the optimizer.
pub const MAX_ANNUAL_GIFT: i64 = 5_000;

/// Recipients sharing one gift duration; they always receive the same
/// annual amount.
#[derive(Debug, Clone)]
struct DurationGroup {
    years: i64,
    members: Vec<usize>,
}

/// Searches annual gift amounts that maximise the proposed scenario's net
/// proceeds.
///
/// Coordinate descent over duration groups: each group is searched in turn
/// with the others held fixed, first on a coarse grid and then on a fine one
/// around the coarse best. This finds a good schedule, not necessarily the
/// global optimum. Recipients with no years are returned as given.
pub fn optimize_gift_amounts(
    estate_value: i64,
    composition: &HouseholdComposition,
    recipients: &[GiftRecipient],
    spouse_mode: SpouseMode,
) -> Vec<GiftRecipient> {
    let mut current = recipients.to_vec();
    if current.is_empty() || estate_value <= 0 {
        return current;
    }

    let groups = group_by_years(&current);
    for iteration in 1..=MAX_ITERATIONS {
        let mut changed = false;
        for group in &groups {
            let best = search_group(estate_value, composition, &current, group, spouse_mode);
            for &idx in &group.members {
                if current[idx].annual_amount != best {
                    changed = true;
                }
                current[idx].annual_amount = best;
            }
        }
        debug!(
            iteration,
            groups = groups.len(),
            changed,
            "gift optimizer iteration"
        );
        if !changed {
            break;
        }
    }
    current
}

fn group_by_years(recipients: &[GiftRecipient]) -> Vec<DurationGroup> {
    let mut groups: Vec<DurationGroup> = Vec::new();
    for (idx, r) in recipients.iter().enumerate() {
        if r.years <= 0 {
            continue;
        }
        match groups.iter_mut().find(|g| g.years == r.years) {
            Some(group) => group.members.push(idx),
            None => groups.push(DurationGroup {
                years: r.years,
                members: vec![idx],
            }),
        }
    }
    groups
}

fn search_group(
    estate_value: i64,
    composition: &HouseholdComposition,
    current: &[GiftRecipient],
    group: &DurationGroup,
    spouse_mode: SpouseMode,
) -> i64 {
    let other_total = saturating_sum(
        current
            .iter()
            .enumerate()
            .filter(|(idx, _)| !group.members.contains(idx))
            .map(|(_, r)| r.annual_amount.max(0).saturating_mul(r.years.max(0))),
    );
    let group_size = group.members.len() as i64;
    let max_amount = (estate_value.saturating_sub(other_total).max(0)
        / group_size.saturating_mul(group.years))
    .min(MAX_ANNUAL_GIFT);

    let mut trial = current.to_vec();
    let mut best = Candidate {
        amount: 0,
        net: i64::MIN,
    };

    for amount in (0..=max_amount).step_by(COARSE_STEP as usize) {
        let net = evaluate(estate_value, composition, &mut trial, group, amount, spouse_mode);
        best.offer(amount, net);
    }

    let low = (best.amount - FINE_RADIUS).max(0);
    let high = (best.amount + FINE_RADIUS).min(max_amount);
    for amount in (low..=high).step_by(FINE_STEP as usize) {
        let net = evaluate(estate_value, composition, &mut trial, group, amount, spouse_mode);
        best.offer(amount, net);
    }

    best.amount
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    amount: i64,
    net: i64,
}

impl Candidate {
    // ties keep the earlier amount
    fn offer(&mut self, amount: i64, net: i64) {
        if net > self.net {
            self.amount = amount;
            self.net = net;
        }
    }
}

fn evaluate(
    estate_value: i64,
    composition: &HouseholdComposition,
    trial: &mut [GiftRecipient],
    group: &DurationGroup,
    amount: i64,
    spouse_mode: SpouseMode,
) -> i64 {
    for &idx in &group.members {
        trial[idx].annual_amount = amount;
    }
    calculate_cash_gift_simulation(estate_value, composition, trial, spouse_mode)
        .proposed
        .total_net_proceeds
}
