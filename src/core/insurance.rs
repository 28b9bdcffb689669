use std::collections::HashMap;

use super::census::{beneficiary_options, determine_heir_census};
use super::engine::calculate_detailed_inheritance_tax;
use super::reapportion::{AcquisitionModel, reapportion_tax};
use super::tables::{INSURANCE_EXEMPT_PER_HEIR, pro_rata, saturating_sum};
use super::types::{
    ContractCategory, HeirTaxBreakdown, HouseholdComposition, InsuranceContract,
    InsuranceHeirBreakdown, InsuranceScenarioResult, InsuranceSimulationResult, SpouseMode,
};

pub const CURRENT_SCENARIO_LABEL: &str = "Current";
pub const PROPOSED_SCENARIO_LABEL: &str = "Proposed";

/// Beneficiary attribution: premiums for new policies come out of the
/// beneficiary's share, and the taxable part of the proceeds is added to it.
struct BeneficiaryModel<'a> {
    by_heir: HashMap<&'a str, &'a InsuranceHeirBreakdown>,
    adjusted_estate: i64,
}

impl AcquisitionModel for BeneficiaryModel<'_> {
    fn adjust(&self, breakdowns: &mut [HeirTaxBreakdown]) {
        for b in breakdowns.iter_mut() {
            if let Some(ins) = self.by_heir.get(b.heir_id.as_str()) {
                b.acquisition_amount = b
                    .acquisition_amount
                    .saturating_add(ins.taxable_amount)
                    .saturating_sub(ins.premium_paid);
            }
        }
    }

    fn denominator(&self, _breakdowns: &[HeirTaxBreakdown]) -> i64 {
        self.adjusted_estate
    }
}

/// Totals benefits (and new-policy premiums) per beneficiary and spreads the
/// exempt allowance pro rata. Contracts naming an unknown beneficiary are
/// ignored.
pub fn calculate_heir_insurance_breakdowns(
    contracts: &[InsuranceContract],
    non_taxable_limit: i64,
    composition: &HouseholdComposition,
) -> Vec<InsuranceHeirBreakdown> {
    let options = beneficiary_options(composition);

    let mut benefits = HashMap::<&str, i64>::new();
    let mut premiums = HashMap::<&str, i64>::new();
    for option in &options {
        benefits.insert(option.heir_id.as_str(), 0);
        premiums.insert(option.heir_id.as_str(), 0);
    }
    for contract in contracts {
        let key = contract.beneficiary_id.as_str();
        let Some(benefit) = benefits.get_mut(key) else {
            continue;
        };
        *benefit = benefit.saturating_add(contract.benefit.max(0));
        if contract.category == ContractCategory::New {
            if let Some(premium) = premiums.get_mut(key) {
                *premium = premium.saturating_add(contract.premium.max(0));
            }
        }
    }

    let total_benefit = saturating_sum(benefits.values().copied());
    let exempt_used = total_benefit.min(non_taxable_limit.max(0));

    // the maps borrow their keys from `options`
    options
        .iter()
        .map(|option| {
            let benefit = benefits[option.heir_id.as_str()];
            let premium = premiums[option.heir_id.as_str()];
            let non_taxable = pro_rata(exempt_used, benefit, total_benefit);
            InsuranceHeirBreakdown {
                heir_id: option.heir_id.clone(),
                label: option.label.clone(),
                total_benefit: benefit,
                non_taxable_amount: non_taxable,
                taxable_amount: benefit - non_taxable,
                premium_paid: premium,
            }
        })
        .collect()
}

pub fn calculate_insurance_scenario(
    label: &str,
    base_estate: i64,
    contracts: &[InsuranceContract],
    premium_deduction: i64,
    non_taxable_limit: i64,
    composition: &HouseholdComposition,
    spouse_mode: SpouseMode,
) -> InsuranceScenarioResult {
    let heir_breakdowns =
        calculate_heir_insurance_breakdowns(contracts, non_taxable_limit, composition);

    let total_benefit = saturating_sum(heir_breakdowns.iter().map(|b| b.total_benefit));
    let non_taxable_amount = saturating_sum(heir_breakdowns.iter().map(|b| b.non_taxable_amount));
    let taxable_insurance = total_benefit.saturating_sub(non_taxable_amount);
    let estate_after_premiums = base_estate.saturating_sub(premium_deduction);
    let adjusted_estate = estate_after_premiums.saturating_add(taxable_insurance).max(0);

    let base_result = calculate_detailed_inheritance_tax(adjusted_estate, composition, spouse_mode);
    let model = BeneficiaryModel {
        by_heir: heir_breakdowns
            .iter()
            .map(|b| (b.heir_id.as_str(), b))
            .collect(),
        adjusted_estate,
    };
    let tax_result = reapportion_tax(&base_result, base_estate, composition, spouse_mode, &model);

    let total_net_proceeds = estate_after_premiums
        .saturating_add(total_benefit)
        .saturating_sub(tax_result.total_final_tax);

    InsuranceScenarioResult {
        label: label.to_string(),
        total_benefit,
        non_taxable_limit,
        non_taxable_amount,
        taxable_insurance,
        adjusted_estate,
        premium_deduction,
        total_net_proceeds,
        tax_result,
        heir_breakdowns,
    }
}

/// Current (existing policies, premiums already paid) versus proposed
/// (existing plus new policies, new premiums taken out of the estate).
pub fn calculate_insurance_simulation(
    estate_value: i64,
    composition: &HouseholdComposition,
    existing_contracts: &[InsuranceContract],
    new_contracts: &[InsuranceContract],
    spouse_mode: SpouseMode,
) -> InsuranceSimulationResult {
    let census = determine_heir_census(composition);
    let non_taxable_limit = INSURANCE_EXEMPT_PER_HEIR * census.total_heirs_count as i64;
    let new_premium_total = saturating_sum(new_contracts.iter().map(|c| c.premium.max(0)));

    let current = calculate_insurance_scenario(
        CURRENT_SCENARIO_LABEL,
        estate_value,
        existing_contracts,
        0,
        non_taxable_limit,
        composition,
        spouse_mode,
    );

    let all_contracts = existing_contracts
        .iter()
        .chain(new_contracts)
        .cloned()
        .collect::<Vec<_>>();
    let proposed = calculate_insurance_scenario(
        PROPOSED_SCENARIO_LABEL,
        estate_value,
        &all_contracts,
        new_premium_total,
        non_taxable_limit,
        composition,
        spouse_mode,
    );

    InsuranceSimulationResult {
        tax_saving: current
            .tax_result
            .total_final_tax
            .saturating_sub(proposed.tax_result.total_final_tax),
        net_proceeds_diff: proposed
            .total_net_proceeds
            .saturating_sub(current.total_net_proceeds),
        current,
        proposed,
        new_premium_total,
        base_estate: estate_value,
    }
}

/// The heir's share of the estate before premiums and taxable proceeds were
/// attributed to them.
pub fn heir_base_acquisition(scenario: &InsuranceScenarioResult, index: usize) -> i64 {
    let (Some(ins), Some(tax)) = (
        scenario.heir_breakdowns.get(index),
        scenario.tax_result.heir_breakdowns.get(index),
    ) else {
        return 0;
    };
    tax.acquisition_amount
        .saturating_add(ins.premium_paid)
        .saturating_sub(ins.taxable_amount)
}

/// Estate share net of premiums, plus all proceeds, minus tax owed.
pub fn heir_net_proceeds(scenario: &InsuranceScenarioResult, index: usize) -> i64 {
    let (Some(ins), Some(tax)) = (
        scenario.heir_breakdowns.get(index),
        scenario.tax_result.heir_breakdowns.get(index),
    ) else {
        return 0;
    };
    tax.acquisition_amount
        .saturating_add(ins.non_taxable_amount)
        .saturating_sub(tax.final_tax)
}
