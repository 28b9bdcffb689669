use super::census::determine_heir_census;
use super::engine::{
    apply_spouse_deduction, apply_third_rank_surcharge, assign_baseline_acquisitions,
    settle_final_tax,
};
use super::tables::{legal_share_ratios, pro_rata, rate_percent};
use super::types::{
    DetailedTaxCalculationResult, HeirTaxBreakdown, HouseholdComposition, SpouseMode,
};

/// How an attribution model moves acquisitions away from the plain split and
/// what the apportionment denominator becomes.
pub trait AcquisitionModel {
    fn adjust(&self, breakdowns: &mut [HeirTaxBreakdown]);
    fn denominator(&self, breakdowns: &[HeirTaxBreakdown]) -> i64;
}

/// Adapter for ad-hoc models built from two closures.
pub struct ClosureModel<A, D> {
    adjust: A,
    denominator: D,
}

impl<A, D> ClosureModel<A, D>
where
    A: Fn(&mut [HeirTaxBreakdown]),
    D: Fn(&[HeirTaxBreakdown]) -> i64,
{
    pub fn new(adjust: A, denominator: D) -> Self {
        Self {
            adjust,
            denominator,
        }
    }
}

impl<A, D> AcquisitionModel for ClosureModel<A, D>
where
    A: Fn(&mut [HeirTaxBreakdown]),
    D: Fn(&[HeirTaxBreakdown]) -> i64,
{
    fn adjust(&self, breakdowns: &mut [HeirTaxBreakdown]) {
        (self.adjust)(breakdowns)
    }

    fn denominator(&self, breakdowns: &[HeirTaxBreakdown]) -> i64 {
        (self.denominator)(breakdowns)
    }
}

/// Redistributes `base.total_tax` after `model` has reassigned acquisitions.
///
/// Acquisitions start from `base_estate` (the estate before the model's
/// adjustments) under `spouse_mode`; surcharge, spouse relief and final tax
/// are rederived against the model's denominator. The total tax itself is
/// carried over unchanged and `base` is left untouched.
pub fn reapportion_tax(
    base: &DetailedTaxCalculationResult,
    base_estate: i64,
    composition: &HouseholdComposition,
    spouse_mode: SpouseMode,
    model: &impl AcquisitionModel,
) -> DetailedTaxCalculationResult {
    let mut breakdowns = base.heir_breakdowns.clone();
    if breakdowns.is_empty() {
        return base.clone();
    }

    let census = determine_heir_census(composition);
    let spouse_ratio = legal_share_ratios(composition.has_spouse, census.rank).spouse;

    assign_baseline_acquisitions(&mut breakdowns, base_estate, spouse_ratio, spouse_mode);
    model.adjust(&mut breakdowns);

    let total_tax = base.total_tax;
    let denominator = model.denominator(&breakdowns);
    for b in &mut breakdowns {
        b.proportional_tax = pro_rata(total_tax, b.acquisition_amount, denominator);
        b.spouse_deduction = 0;
    }

    apply_third_rank_surcharge(&mut breakdowns, census.rank == 3);
    let spouse_deduction_detail =
        apply_spouse_deduction(&mut breakdowns, total_tax, denominator, spouse_ratio);
    let total_final_tax = settle_final_tax(&mut breakdowns);

    DetailedTaxCalculationResult {
        heir_breakdowns: breakdowns,
        spouse_deduction_detail,
        total_final_tax,
        effective_tax_rate: rate_percent(total_final_tax, denominator),
        ..base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::calculate_detailed_inheritance_tax;
    use crate::core::types::{Heir, HeirType, SelectedRank};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn household(has_spouse: bool, rank: SelectedRank, heirs: usize) -> HouseholdComposition {
        let mut c = HouseholdComposition {
            has_spouse,
            selected_rank: rank,
            ..HouseholdComposition::default()
        };
        let list = match rank {
            SelectedRank::Rank1 => &mut c.rank1_children,
            SelectedRank::Rank2 => &mut c.rank2_ascendants,
            _ => &mut c.rank3_siblings,
        };
        let heir_type = match rank {
            SelectedRank::Rank1 => HeirType::Child,
            SelectedRank::Rank2 => HeirType::Parent,
            _ => HeirType::Sibling,
        };
        *list = (0..heirs)
            .map(|i| Heir::living(format!("h{i}"), heir_type))
            .collect();
        c
    }

    fn identity_model(denominator: i64) -> impl AcquisitionModel {
        ClosureModel::new(|_: &mut [HeirTaxBreakdown]| {}, move |_: &[HeirTaxBreakdown]| denominator)
    }

    #[test]
    fn identity_model_reproduces_base_result() {
        let c = household(true, SelectedRank::Rank1, 2);
        let base = calculate_detailed_inheritance_tax(30_000, &c, SpouseMode::Legal);
        let again = reapportion_tax(&base, 30_000, &c, SpouseMode::Legal, &identity_model(30_000));
        assert_eq!(again.total_tax, base.total_tax);
        assert_eq!(again.total_final_tax, base.total_final_tax);
        assert_eq!(again.heir_breakdowns, base.heir_breakdowns);
        assert_eq!(again.spouse_deduction_detail, base.spouse_deduction_detail);
    }

    #[test]
    fn base_result_is_not_mutated() {
        let c = household(true, SelectedRank::Rank1, 2);
        let base = calculate_detailed_inheritance_tax(30_000, &c, SpouseMode::Legal);
        let snapshot = base.clone();
        let shift = ClosureModel::new(
            |b: &mut [HeirTaxBreakdown]| b[1].acquisition_amount += 5_000,
            |b: &[HeirTaxBreakdown]| b.iter().map(|x| x.acquisition_amount).sum(),
        );
        let moved = reapportion_tax(&base, 30_000, &c, SpouseMode::Legal, &shift);
        assert_eq!(base, snapshot);
        assert_eq!(moved.total_tax, base.total_tax);
        assert!(moved.heir_breakdowns[1].final_tax > base.heir_breakdowns[1].final_tax);
    }

    #[test]
    fn non_positive_denominator_zeroes_the_distribution() {
        let c = household(false, SelectedRank::Rank1, 2);
        let base = calculate_detailed_inheritance_tax(30_000, &c, SpouseMode::Legal);
        let result = reapportion_tax(&base, 30_000, &c, SpouseMode::Legal, &identity_model(0));
        assert_eq!(result.total_tax, base.total_tax);
        assert_eq!(result.total_final_tax, 0);
        assert_eq!(result.effective_tax_rate, 0.0);
        assert!(result.heir_breakdowns.iter().all(|b| b.proportional_tax == 0));
    }

    #[test]
    fn empty_breakdowns_return_the_base() {
        let c = household(false, SelectedRank::None, 0);
        let base = calculate_detailed_inheritance_tax(30_000, &c, SpouseMode::Legal);
        let result = reapportion_tax(&base, 30_000, &c, SpouseMode::Legal, &identity_model(30_000));
        assert_eq!(result, base);
    }

    #[test]
    fn spouse_deduction_uses_denominator_for_legal_share() {
        let c = household(true, SelectedRank::Rank1, 1);
        let base = calculate_detailed_inheritance_tax(100_000, &c, SpouseMode::Legal);
        let result = reapportion_tax(
            &base,
            100_000,
            &c,
            SpouseMode::Custom { value: 80_000 },
            &identity_model(60_000),
        );
        let detail = result.spouse_deduction_detail.expect("detail");
        assert_eq!(detail.legal_share_amount, 30_000);
        assert_eq!(detail.deduction_limit, 30_000);
        assert_eq!(detail.acquisition_amount, 80_000);
        assert_eq!(
            detail.actual_deduction,
            pro_rata(base.total_tax, 30_000, 60_000).min(detail.tax_before_deduction)
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_identity_reapportion_matches_base(
            estate in 0i64..300_000,
            has_spouse in proptest::bool::ANY,
            rank_idx in 1u8..4,
            heirs in 0usize..5,
            limit_mode in proptest::bool::ANY
        ) {
            let rank = match rank_idx {
                1 => SelectedRank::Rank1,
                2 => SelectedRank::Rank2,
                _ => SelectedRank::Rank3,
            };
            let mode = if limit_mode { SpouseMode::Limit160m } else { SpouseMode::Legal };
            let c = household(has_spouse, rank, heirs);
            let base = calculate_detailed_inheritance_tax(estate, &c, mode);
            let again = reapportion_tax(&base, estate, &c, mode, &identity_model(estate));
            prop_assert_eq!(again.total_tax, base.total_tax);
            prop_assert_eq!(again.total_final_tax, base.total_final_tax);
        }

        #[test]
        fn prop_rank_three_surcharge_is_a_fifth(
            estate in 5_000i64..300_000,
            has_spouse in proptest::bool::ANY,
            heirs in 1usize..5,
            bonus in 0i64..20_000
        ) {
            let c = household(has_spouse, SelectedRank::Rank3, heirs);
            let base = calculate_detailed_inheritance_tax(estate, &c, SpouseMode::Legal);
            let model = ClosureModel::new(
                move |b: &mut [HeirTaxBreakdown]| {
                    if let Some(last) = b.last_mut() {
                        last.acquisition_amount += bonus;
                    }
                },
                |b: &[HeirTaxBreakdown]| b.iter().map(|x| x.acquisition_amount).sum(),
            );
            let result = reapportion_tax(&base, estate, &c, SpouseMode::Legal, &model);
            for b in &result.heir_breakdowns {
                if b.is_spouse() {
                    prop_assert_eq!(b.surcharge_amount, 0);
                } else {
                    prop_assert_eq!(b.surcharge_amount, b.proportional_tax.div_euclid(5));
                }
                prop_assert!(b.final_tax >= 0);
            }
        }
    }
}
