use std::collections::HashMap;

use super::bracket::{calculate_gift_tax_per_year, gift_taxable_amount};
use super::engine::calculate_detailed_inheritance_tax;
use super::reapportion::{AcquisitionModel, reapportion_tax};
use super::tables::saturating_sum;
use super::types::{
    CashGiftSimulationResult, DetailedTaxCalculationResult, GiftRecipient, GiftRecipientResult,
    GiftScenarioResult, HeirTaxBreakdown, HouseholdComposition, SpouseMode,
};

pub const CURRENT_SCENARIO_LABEL: &str = "Current";
pub const PROPOSED_SCENARIO_LABEL: &str = "Proposed";

pub fn calculate_recipient_result(recipient: &GiftRecipient) -> GiftRecipientResult {
    let annual_amount = recipient.annual_amount.max(0);
    let years = recipient.years.max(0);
    let gift_tax_per_year = calculate_gift_tax_per_year(annual_amount);
    let total_gift = annual_amount.saturating_mul(years);
    let total_gift_tax = gift_tax_per_year.saturating_mul(years);
    GiftRecipientResult {
        id: recipient.id.clone(),
        heir_id: recipient.heir_id.clone(),
        heir_label: recipient.heir_label.clone(),
        annual_amount,
        years,
        taxable_amount_per_year: gift_taxable_amount(annual_amount),
        gift_tax_per_year,
        total_gift,
        total_gift_tax,
        net_gift: total_gift - total_gift_tax,
    }
}

/// Recipient attribution: whatever an heir already received as gifts comes
/// off their acquisition (never below zero); the denominator is what is
/// left to apportion.
struct RecipientModel {
    gifts_by_heir: HashMap<String, i64>,
}

impl RecipientModel {
    fn new(results: &[GiftRecipientResult]) -> Self {
        let mut gifts_by_heir = HashMap::new();
        for r in results {
            let received = gifts_by_heir.entry(r.heir_id.clone()).or_insert(0i64);
            *received = received.saturating_add(r.total_gift);
        }
        Self { gifts_by_heir }
    }
}

impl AcquisitionModel for RecipientModel {
    fn adjust(&self, breakdowns: &mut [HeirTaxBreakdown]) {
        for b in breakdowns.iter_mut() {
            let received = self.gifts_by_heir.get(&b.heir_id).copied().unwrap_or(0);
            if received > 0 {
                b.acquisition_amount = b.acquisition_amount.saturating_sub(received).max(0);
            }
        }
    }

    fn denominator(&self, breakdowns: &[HeirTaxBreakdown]) -> i64 {
        saturating_sum(breakdowns.iter().map(|b| b.acquisition_amount))
    }
}

fn reapportion_for_gifts(
    base: &DetailedTaxCalculationResult,
    base_estate: i64,
    results: &[GiftRecipientResult],
    composition: &HouseholdComposition,
    spouse_mode: SpouseMode,
) -> DetailedTaxCalculationResult {
    reapportion_tax(
        base,
        base_estate,
        composition,
        spouse_mode,
        &RecipientModel::new(results),
    )
}

/// Compares leaving the estate untouched with giving `recipients` their
/// annual amounts first.
pub fn calculate_cash_gift_simulation(
    estate_value: i64,
    composition: &HouseholdComposition,
    recipients: &[GiftRecipient],
    spouse_mode: SpouseMode,
) -> CashGiftSimulationResult {
    let recipient_results = recipients
        .iter()
        .map(calculate_recipient_result)
        .collect::<Vec<_>>();
    let total_gifts = saturating_sum(recipient_results.iter().map(|r| r.total_gift));
    let total_gift_tax = saturating_sum(recipient_results.iter().map(|r| r.total_gift_tax));

    let current_tax = calculate_detailed_inheritance_tax(estate_value, composition, spouse_mode);
    let current = GiftScenarioResult {
        label: CURRENT_SCENARIO_LABEL.to_string(),
        estate_value,
        total_net_proceeds: estate_value.saturating_sub(current_tax.total_final_tax),
        tax_result: current_tax,
    };

    let reduced_estate = estate_value.saturating_sub(total_gifts).max(0);
    let base = calculate_detailed_inheritance_tax(reduced_estate, composition, spouse_mode);
    let proposed_tax = reapportion_for_gifts(
        &base,
        estate_value,
        &recipient_results,
        composition,
        spouse_mode,
    );
    let proposed = GiftScenarioResult {
        label: PROPOSED_SCENARIO_LABEL.to_string(),
        estate_value: reduced_estate,
        total_net_proceeds: estate_value
            .saturating_sub(proposed_tax.total_final_tax)
            .saturating_sub(total_gift_tax),
        tax_result: proposed_tax,
    };

    CashGiftSimulationResult {
        inheritance_tax_saving: current
            .tax_result
            .total_final_tax
            .saturating_sub(proposed.tax_result.total_final_tax),
        net_proceeds_diff: proposed
            .total_net_proceeds
            .saturating_sub(current.total_net_proceeds),
        current,
        proposed,
        recipient_results,
        total_gifts,
        total_gift_tax,
        base_estate: estate_value,
    }
}

/// What one heir ends up with: their estate share after tax plus the gifts
/// they received net of gift tax.
pub fn gift_heir_net_proceeds(
    scenario: &GiftScenarioResult,
    heir_index: usize,
    recipient_results: &[GiftRecipientResult],
) -> i64 {
    let Some(b) = scenario.tax_result.heir_breakdowns.get(heir_index) else {
        return 0;
    };
    let gifts = saturating_sum(
        recipient_results
            .iter()
            .filter(|r| r.heir_id == b.heir_id)
            .map(|r| r.net_gift),
    );
    b.acquisition_amount
        .saturating_sub(b.final_tax)
        .saturating_add(gifts)
}
