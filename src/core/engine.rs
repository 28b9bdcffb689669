use super::bracket::bracket_tax;
use super::census::{active_heirs, determine_heir_census, spouse_slot};
use super::tables::{
    HIGHLIGHT_INTERVAL, QUICK_TABLE_MAX, QUICK_TABLE_MIN, QUICK_TABLE_STEP,
    SPOUSE_DEDUCTION_LIMIT, THIRD_RANK_SURCHARGE_PERCENT, basic_deduction, legal_share_ratios,
    percent_of, pro_rata, rate_percent, saturating_sum,
};
use super::types::{
    DetailedTaxCalculationResult, HeirSlot, HeirTaxBreakdown, HouseholdComposition, ShareRatio,
    SpouseDeductionDetail, SpouseMode, TaxCalculationResult,
};

/// Estate sweep used by the quick-reference table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableRange {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl Default for TableRange {
    fn default() -> Self {
        Self {
            min: QUICK_TABLE_MIN,
            max: QUICK_TABLE_MAX,
            step: QUICK_TABLE_STEP,
        }
    }
}

/// Quick estimate used for sweep tables. The post-deduction figure halves the
/// total whenever a spouse exists instead of running the exact spouse relief.
pub fn calculate_inheritance_tax(
    estate_value: i64,
    composition: &HouseholdComposition,
) -> TaxCalculationResult {
    let census = determine_heir_census(composition);
    let basic_deduction = basic_deduction(census.total_heirs_count);
    let taxable_amount = estate_value.saturating_sub(basic_deduction).max(0);

    if taxable_amount == 0 || census.total_heirs_count == 0 {
        return TaxCalculationResult {
            estate_value,
            basic_deduction,
            taxable_amount: 0,
            total_tax: 0,
            tax_after_spouse_deduction: 0,
            effective_tax_rate: 0.0,
            effective_tax_rate_after_spouse: 0.0,
        };
    }

    let ratios = legal_share_ratios(composition.has_spouse, census.rank);
    let mut total_tax = 0;

    if !ratios.spouse.is_zero() {
        total_tax = bracket_tax(ratios.spouse.of(taxable_amount));
    }

    if !ratios.others.is_zero() && census.rank_heirs_count > 0 {
        let count = census.rank_heirs_count as i64;
        let per_person = ratios.others.of(taxable_amount) / count;
        let mut others_tax = bracket_tax(per_person).saturating_mul(count);
        if census.rank == 3 {
            others_tax = with_third_rank_surcharge(others_tax);
        }
        total_tax = total_tax.saturating_add(others_tax);
    }

    let tax_after_spouse_deduction = if composition.has_spouse {
        percent_of(total_tax, 50)
    } else {
        total_tax
    };

    TaxCalculationResult {
        estate_value,
        basic_deduction,
        taxable_amount,
        total_tax,
        tax_after_spouse_deduction,
        effective_tax_rate: rate_percent(total_tax, estate_value),
        effective_tax_rate_after_spouse: rate_percent(tax_after_spouse_deduction, estate_value),
    }
}

pub fn calculate_quick_table(
    range: TableRange,
    composition: &HouseholdComposition,
) -> Vec<TaxCalculationResult> {
    if range.step <= 0 || range.min > range.max {
        return Vec::new();
    }
    let mut rows = Vec::new();
    let mut estate = range.min;
    loop {
        rows.push(calculate_inheritance_tax(estate, composition));
        match estate.checked_add(range.step) {
            Some(next) if next <= range.max => estate = next,
            _ => break,
        }
    }
    rows
}

pub fn is_highlight_row(estate_value: i64) -> bool {
    estate_value % HIGHLIGHT_INTERVAL == 0
}

/// Per-heir calculation: total tax from legal shares, apportioned by the
/// acquisition each heir actually takes under `spouse_mode`.
pub fn calculate_detailed_inheritance_tax(
    estate_value: i64,
    composition: &HouseholdComposition,
    spouse_mode: SpouseMode,
) -> DetailedTaxCalculationResult {
    let census = determine_heir_census(composition);
    let basic_deduction = basic_deduction(census.total_heirs_count);
    let taxable_amount = estate_value.saturating_sub(basic_deduction).max(0);
    let ratios = legal_share_ratios(composition.has_spouse, census.rank);
    let heirs = active_heirs(composition);
    let surcharged = census.rank == 3;

    let mut breakdowns = Vec::with_capacity(census.total_heirs_count);
    if composition.has_spouse {
        breakdowns.push(empty_breakdown(spouse_slot(), ratios.spouse.as_f64()));
    }
    let per_person_ratio = if heirs.is_empty() {
        0.0
    } else {
        ratios.others.as_f64() / heirs.len() as f64
    };
    breakdowns.extend(
        heirs
            .into_iter()
            .map(|slot| empty_breakdown(slot, per_person_ratio)),
    );

    if taxable_amount == 0 || census.total_heirs_count == 0 {
        return DetailedTaxCalculationResult {
            estate_value,
            basic_deduction,
            taxable_amount: 0,
            total_tax: 0,
            heir_breakdowns: breakdowns,
            spouse_deduction_detail: None,
            total_final_tax: 0,
            effective_tax_rate: 0.0,
        };
    }

    let others_per_person = if census.rank_heirs_count > 0 {
        ratios.others.of(taxable_amount) / census.rank_heirs_count as i64
    } else {
        0
    };
    for b in &mut breakdowns {
        if b.is_spouse() {
            b.legal_share_amount = ratios.spouse.of(taxable_amount);
            b.tax_on_share = bracket_tax(b.legal_share_amount);
        } else {
            b.legal_share_amount = others_per_person;
            b.tax_on_share = bracket_tax(others_per_person);
            if surcharged {
                b.tax_on_share = with_third_rank_surcharge(b.tax_on_share);
            }
        }
    }
    let total_tax = saturating_sum(breakdowns.iter().map(|b| b.tax_on_share));

    assign_baseline_acquisitions(&mut breakdowns, estate_value, ratios.spouse, spouse_mode);

    for b in &mut breakdowns {
        b.proportional_tax = pro_rata(total_tax, b.acquisition_amount, estate_value);
    }
    apply_third_rank_surcharge(&mut breakdowns, surcharged);
    let spouse_deduction_detail =
        apply_spouse_deduction(&mut breakdowns, total_tax, estate_value, ratios.spouse);
    let total_final_tax = settle_final_tax(&mut breakdowns);

    DetailedTaxCalculationResult {
        estate_value,
        basic_deduction,
        taxable_amount,
        total_tax,
        heir_breakdowns: breakdowns,
        spouse_deduction_detail,
        total_final_tax,
        effective_tax_rate: rate_percent(total_final_tax, estate_value),
    }
}

fn empty_breakdown(slot: HeirSlot, legal_share_ratio: f64) -> HeirTaxBreakdown {
    HeirTaxBreakdown {
        heir_id: slot.heir_id,
        label: slot.label,
        heir_type: slot.heir_type,
        legal_share_ratio,
        legal_share_amount: 0,
        tax_on_share: 0,
        acquisition_amount: 0,
        proportional_tax: 0,
        surcharge_amount: 0,
        spouse_deduction: 0,
        final_tax: 0,
    }
}

fn with_third_rank_surcharge(tax: i64) -> i64 {
    percent_of(tax, 100 + THIRD_RANK_SURCHARGE_PERCENT)
}

/// What the spouse takes out of `estate` under the chosen mode.
pub(crate) fn spouse_acquisition(
    estate: i64,
    spouse_ratio: ShareRatio,
    spouse_mode: SpouseMode,
) -> i64 {
    match spouse_mode {
        SpouseMode::Legal => spouse_ratio.of(estate),
        SpouseMode::Limit160m => estate.min(SPOUSE_DEDUCTION_LIMIT),
        SpouseMode::Custom { value } => value.max(0).min(estate),
    }
}

/// Spouse by mode, everyone else splits what is left evenly. Without a
/// spouse the estate is split evenly across all heirs.
pub(crate) fn assign_baseline_acquisitions(
    breakdowns: &mut [HeirTaxBreakdown],
    estate: i64,
    spouse_ratio: ShareRatio,
    spouse_mode: SpouseMode,
) {
    if breakdowns.is_empty() {
        return;
    }
    let Some(spouse_idx) = breakdowns.iter().position(HeirTaxBreakdown::is_spouse) else {
        let per_person = estate.div_euclid(breakdowns.len() as i64);
        for b in breakdowns.iter_mut() {
            b.acquisition_amount = per_person;
        }
        return;
    };

    let spouse_amount = spouse_acquisition(estate, spouse_ratio, spouse_mode);
    breakdowns[spouse_idx].acquisition_amount = spouse_amount;

    let other_count = breakdowns.len() as i64 - 1;
    if other_count > 0 {
        let per_person = estate.saturating_sub(spouse_amount).div_euclid(other_count);
        for (idx, b) in breakdowns.iter_mut().enumerate() {
            if idx != spouse_idx {
                b.acquisition_amount = per_person;
            }
        }
    }
}

/// Resets every surcharge, then adds 20% of the apportioned tax for each
/// non-spouse heir when the third rank is live.
pub(crate) fn apply_third_rank_surcharge(breakdowns: &mut [HeirTaxBreakdown], surcharged: bool) {
    for b in breakdowns.iter_mut() {
        b.surcharge_amount = if surcharged && !b.is_spouse() {
            percent_of(b.proportional_tax, THIRD_RANK_SURCHARGE_PERCENT)
        } else {
            0
        };
    }
}

/// Spouse relief: fully forgiven up to max(legal share, 16,000); above that
/// the relief is the tax on the limit, capped at what the spouse owes.
pub(crate) fn apply_spouse_deduction(
    breakdowns: &mut [HeirTaxBreakdown],
    total_tax: i64,
    denominator: i64,
    spouse_ratio: ShareRatio,
) -> Option<SpouseDeductionDetail> {
    let spouse = breakdowns.iter_mut().find(|b| b.is_spouse())?;

    let legal_share_amount = spouse_ratio.of(denominator);
    let deduction_limit = legal_share_amount.max(SPOUSE_DEDUCTION_LIMIT);
    let tax_before_deduction = spouse.proportional_tax.saturating_add(spouse.surcharge_amount);

    let actual_deduction = if spouse.acquisition_amount <= deduction_limit {
        tax_before_deduction
    } else {
        pro_rata(total_tax, deduction_limit, denominator).min(tax_before_deduction)
    };
    spouse.spouse_deduction = actual_deduction;

    Some(SpouseDeductionDetail {
        acquisition_amount: spouse.acquisition_amount,
        legal_share_amount,
        limit160m: SPOUSE_DEDUCTION_LIMIT,
        deduction_limit,
        tax_before_deduction,
        actual_deduction,
    })
}

pub(crate) fn settle_final_tax(breakdowns: &mut [HeirTaxBreakdown]) -> i64 {
    for b in breakdowns.iter_mut() {
        b.final_tax = b
            .proportional_tax
            .saturating_add(b.surcharge_amount)
            .saturating_sub(b.spouse_deduction)
            .max(0);
    }
    saturating_sum(breakdowns.iter().map(|b| b.final_tax))
}
