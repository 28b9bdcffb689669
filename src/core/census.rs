use std::collections::HashMap;

use super::types::{Heir, HeirCensus, HeirSlot, HeirType, HouseholdComposition, SelectedRank};

pub const SPOUSE_ID: &str = "spouse";

/// Counts the statutory heirs of the live rank, resolving substitution one
/// level deep.
pub fn determine_heir_census(composition: &HouseholdComposition) -> HeirCensus {
    let rank_heirs_count = composition
        .active_list()
        .iter()
        .map(substituted_count)
        .sum::<usize>();

    let rank = if rank_heirs_count == 0 {
        0
    } else {
        match composition.selected_rank {
            SelectedRank::None => 0,
            SelectedRank::Rank1 => 1,
            SelectedRank::Rank2 => 2,
            SelectedRank::Rank3 => 3,
        }
    };

    HeirCensus {
        rank,
        total_heirs_count: usize::from(composition.has_spouse) + rank_heirs_count,
        rank_heirs_count,
    }
}

fn substituted_count(heir: &Heir) -> usize {
    if heir.is_deceased {
        heir.representatives.len()
    } else {
        1
    }
}

/// The non-spouse heirs of the live rank in entry order, with a deceased
/// heir replaced in place by their representatives.
pub fn active_heirs(composition: &HouseholdComposition) -> Vec<HeirSlot> {
    let people = composition
        .active_list()
        .iter()
        .flat_map(|heir| {
            if heir.is_deceased {
                heir.representatives.iter().collect::<Vec<_>>()
            } else {
                vec![heir]
            }
        })
        .collect::<Vec<_>>();

    let mut per_type = HashMap::<HeirType, usize>::new();
    for person in &people {
        *per_type.entry(person.heir_type).or_default() += 1;
    }

    let mut seen = HashMap::<HeirType, usize>::new();
    people
        .into_iter()
        .map(|person| {
            let ordinal = seen.entry(person.heir_type).or_default();
            *ordinal += 1;
            let label = if per_type[&person.heir_type] > 1 {
                format!("{} {}", person.heir_type.display_name(), ordinal)
            } else {
                person.heir_type.display_name().to_string()
            };
            HeirSlot {
                heir_id: person.id.clone(),
                label,
                heir_type: person.heir_type,
            }
        })
        .collect()
}

pub fn spouse_slot() -> HeirSlot {
    HeirSlot {
        heir_id: SPOUSE_ID.to_string(),
        label: HeirType::Spouse.display_name().to_string(),
        heir_type: HeirType::Spouse,
    }
}

/// Everyone who can be named as an insurance beneficiary: the spouse first,
/// then the active heirs.
pub fn beneficiary_options(composition: &HouseholdComposition) -> Vec<HeirSlot> {
    let mut options = Vec::new();
    if composition.has_spouse {
        options.push(spouse_slot());
    }
    options.extend(active_heirs(composition));
    options
}

/// Special-rate gifts only flow to lineal descendants, so recipients exist
/// only when children are the live rank.
pub fn gift_recipient_options(composition: &HouseholdComposition) -> Vec<HeirSlot> {
    if composition.selected_rank != SelectedRank::Rank1 {
        return Vec::new();
    }
    beneficiary_options(composition)
        .into_iter()
        .filter(|slot| slot.heir_id != SPOUSE_ID)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert_eq, proptest};

    fn children(n: usize) -> Vec<Heir> {
        (0..n)
            .map(|i| Heir::living(format!("c{i}"), HeirType::Child))
            .collect()
    }

    fn composition(has_spouse: bool, selected_rank: SelectedRank) -> HouseholdComposition {
        HouseholdComposition {
            has_spouse,
            selected_rank,
            ..HouseholdComposition::default()
        }
    }

    #[test]
    fn living_children_count_once_each() {
        let mut c = composition(true, SelectedRank::Rank1);
        c.rank1_children = children(3);
        let census = determine_heir_census(&c);
        assert_eq!(census.rank, 1);
        assert_eq!(census.rank_heirs_count, 3);
        assert_eq!(census.total_heirs_count, 4);
    }

    #[test]
    fn deceased_child_is_replaced_by_representatives() {
        let mut c = composition(false, SelectedRank::Rank1);
        c.rank1_children = vec![
            Heir::living("c1", HeirType::Child),
            Heir::deceased(
                "c2",
                HeirType::Child,
                vec![
                    Heir::living("g1", HeirType::Grandchild),
                    Heir::living("g2", HeirType::Grandchild),
                ],
            ),
            Heir::deceased("c3", HeirType::Child, Vec::new()),
        ];
        let census = determine_heir_census(&c);
        assert_eq!(census.rank_heirs_count, 3);
        assert_eq!(census.total_heirs_count, 3);

        let slots = active_heirs(&c);
        let ids = slots.iter().map(|s| s.heir_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["c1", "g1", "g2"]);
        assert_eq!(slots[0].label, "Child");
        assert_eq!(slots[1].label, "Grandchild 1");
        assert_eq!(slots[2].label, "Grandchild 2");
    }

    #[test]
    fn representatives_of_representatives_are_not_expanded() {
        let mut c = composition(false, SelectedRank::Rank3);
        let nested = Heir::deceased(
            "n1",
            HeirType::NephewNiece,
            vec![Heir::living("x", HeirType::NephewNiece)],
        );
        c.rank3_siblings = vec![Heir::deceased("s1", HeirType::Sibling, vec![nested])];
        let census = determine_heir_census(&c);
        assert_eq!(census.rank_heirs_count, 1);
        assert_eq!(census.rank, 3);
    }

    #[test]
    fn stale_lists_for_other_ranks_are_ignored() {
        let mut c = composition(true, SelectedRank::Rank2);
        c.rank1_children = children(4);
        c.rank3_siblings = vec![Heir::living("s", HeirType::Sibling)];
        c.rank2_ascendants = vec![Heir::living("p", HeirType::Parent)];
        let census = determine_heir_census(&c);
        assert_eq!(census.rank, 2);
        assert_eq!(census.rank_heirs_count, 1);
        assert_eq!(census.total_heirs_count, 2);
    }

    #[test]
    fn empty_selected_rank_reports_rank_zero() {
        let mut c = composition(true, SelectedRank::Rank1);
        c.rank2_ascendants = vec![Heir::living("p", HeirType::Parent)];
        let census = determine_heir_census(&c);
        assert_eq!(census.rank, 0);
        assert_eq!(census.rank_heirs_count, 0);
        assert_eq!(census.total_heirs_count, 1);

        let none = composition(false, SelectedRank::None);
        assert_eq!(determine_heir_census(&none).total_heirs_count, 0);
    }

    #[test]
    fn beneficiary_options_put_spouse_first() {
        let mut c = composition(true, SelectedRank::Rank1);
        c.rank1_children = children(2);
        let options = beneficiary_options(&c);
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].heir_id, SPOUSE_ID);
        assert_eq!(options[1].label, "Child 1");
        assert_eq!(options[2].label, "Child 2");
    }

    #[test]
    fn gift_recipients_require_rank_one() {
        let mut c = composition(true, SelectedRank::Rank1);
        c.rank1_children = children(2);
        assert_eq!(gift_recipient_options(&c).len(), 2);

        c.selected_rank = SelectedRank::Rank3;
        c.rank3_siblings = vec![Heir::living("s", HeirType::Sibling)];
        assert!(gift_recipient_options(&c).is_empty());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_slots_match_rank_count(
            has_spouse in proptest::bool::ANY,
            alive in 0usize..5,
            reps in proptest::collection::vec(0usize..4, 0..4)
        ) {
            let mut c = composition(has_spouse, SelectedRank::Rank1);
            c.rank1_children = children(alive);
            for (i, n) in reps.iter().enumerate() {
                let grandchildren = (0..*n)
                    .map(|j| Heir::living(format!("g{i}-{j}"), HeirType::Grandchild))
                    .collect();
                c.rank1_children.push(Heir::deceased(format!("d{i}"), HeirType::Child, grandchildren));
            }
            let census = determine_heir_census(&c);
            prop_assert_eq!(census.rank_heirs_count, alive + reps.iter().sum::<usize>());
            prop_assert_eq!(active_heirs(&c).len(), census.rank_heirs_count);
            prop_assert_eq!(beneficiary_options(&c).len(), census.total_heirs_count);
        }
    }
}
