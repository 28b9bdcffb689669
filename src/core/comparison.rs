use super::engine::calculate_detailed_inheritance_tax;
use super::tables::percent_of;
use super::types::{ComparisonRow, HouseholdComposition, SpouseMode};

pub const RATIO_STEP: usize = 5;

/// Total tax over both successions for spouse acquisition ratios from 100%
/// down to 0% in 5-point steps.
///
/// The first succession taxes the whole estate with the spouse taking
/// `estate x ratio`; the second taxes the spouse's own estate plus that
/// acquisition for the remaining heirs.
pub fn calculate_comparison_table(
    estate_value: i64,
    spouse_own_estate: i64,
    composition: &HouseholdComposition,
) -> Vec<ComparisonRow> {
    let second_composition = composition.without_spouse();
    (0..=100)
        .rev()
        .step_by(RATIO_STEP)
        .map(|ratio| {
            let spouse_acquisition = percent_of(estate_value.max(0), ratio);
            let first = calculate_detailed_inheritance_tax(
                estate_value,
                composition,
                SpouseMode::Custom {
                    value: spouse_acquisition,
                },
            );
            let second_estate = spouse_own_estate.max(0).saturating_add(spouse_acquisition);
            let second =
                calculate_detailed_inheritance_tax(second_estate, &second_composition, SpouseMode::Legal);
            ComparisonRow {
                ratio,
                spouse_acquisition,
                first_tax: first.total_final_tax,
                second_estate,
                second_tax: second.total_final_tax,
                total_tax: first.total_final_tax.saturating_add(second.total_final_tax),
                first_breakdowns: first.heir_breakdowns,
                second_breakdowns: second.heir_breakdowns,
            }
        })
        .collect()
}

/// First row with the lowest combined tax.
pub fn find_optimal_row(rows: &[ComparisonRow]) -> Option<&ComparisonRow> {
    rows.iter().reduce(|best, row| {
        if row.total_tax < best.total_tax {
            row
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Heir, HeirType, SelectedRank};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn spouse_and_children(n: usize) -> HouseholdComposition {
        HouseholdComposition {
            has_spouse: true,
            selected_rank: SelectedRank::Rank1,
            rank1_children: (0..n)
                .map(|i| Heir::living(format!("c{i}"), HeirType::Child))
                .collect(),
            ..HouseholdComposition::default()
        }
    }

    #[test]
    fn sweeps_twenty_one_ratios_descending() {
        let rows = calculate_comparison_table(40_000, 5_000, &spouse_and_children(2));
        assert_eq!(rows.len(), 21);
        assert_eq!(rows[0].ratio, 100);
        assert_eq!(rows[10].ratio, 50);
        assert_eq!(rows[20].ratio, 0);
        assert!(rows.windows(2).all(|w| w[0].ratio > w[1].ratio));
    }

    #[test]
    fn zero_ratio_leaves_spouse_estate_alone() {
        let rows = calculate_comparison_table(40_000, 5_000, &spouse_and_children(2));
        let last = &rows[20];
        assert_eq!(last.spouse_acquisition, 0);
        assert_eq!(last.second_estate, 5_000);
        assert_eq!(last.first_breakdowns[0].acquisition_amount, 0);
    }

    #[test]
    fn second_succession_has_no_spouse() {
        let rows = calculate_comparison_table(40_000, 0, &spouse_and_children(2));
        let half = &rows[10];
        assert_eq!(half.spouse_acquisition, 20_000);
        assert_eq!(half.second_estate, 20_000);
        assert_eq!(half.second_breakdowns.len(), 2);
        assert!(half.second_breakdowns.iter().all(|b| !b.is_spouse()));
        // 20000 - 4200 = 15800 over two children: 7900 each -> 1670 each
        assert_eq!(half.second_tax, 3_340);
    }

    #[test]
    fn huge_spouse_estate_saturates() {
        let rows = calculate_comparison_table(40_000, i64::MAX, &spouse_and_children(2));
        assert_eq!(rows[0].second_estate, i64::MAX);
        assert_eq!(rows[20].second_estate, i64::MAX);
        assert!(rows.iter().all(|r| r.second_tax > 0 && r.total_tax >= r.second_tax));
    }

    #[test]
    fn optimal_row_prefers_first_minimum() {
        let rows = calculate_comparison_table(60_000, 10_000, &spouse_and_children(2));
        let best = find_optimal_row(&rows).expect("rows");
        let min = rows.iter().map(|r| r.total_tax).min().expect("rows");
        assert_eq!(best.total_tax, min);
        let first_index = rows.iter().position(|r| r.total_tax == min).expect("min");
        assert_eq!(best.ratio, rows[first_index].ratio);
        assert!(find_optimal_row(&[]).is_none());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_rows_add_up(
            estate in 0i64..200_000,
            own in 0i64..50_000,
            children in 1usize..4
        ) {
            let rows = calculate_comparison_table(estate, own, &spouse_and_children(children));
            prop_assert_eq!(rows.len(), 21);
            for row in &rows {
                prop_assert_eq!(row.total_tax, row.first_tax + row.second_tax);
                prop_assert_eq!(row.second_estate, own + row.spouse_acquisition);
                prop_assert!(row.spouse_acquisition <= estate);
            }
        }
    }
}
