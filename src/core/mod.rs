mod bracket;
mod census;
mod comparison;
mod engine;
mod gift;
mod insurance;
mod reapportion;
mod solver;
mod tables;
mod types;

pub use bracket::{bracket_tax, calculate_gift_tax_per_year, gift_taxable_amount};
pub use census::{
    SPOUSE_ID, active_heirs, beneficiary_options, determine_heir_census, gift_recipient_options,
};
pub use comparison::{calculate_comparison_table, find_optimal_row};
pub use engine::{
    TableRange, calculate_detailed_inheritance_tax, calculate_inheritance_tax,
    calculate_quick_table, is_highlight_row,
};
pub use gift::{calculate_cash_gift_simulation, calculate_recipient_result, gift_heir_net_proceeds};
pub use insurance::{
    calculate_heir_insurance_breakdowns, calculate_insurance_scenario,
    calculate_insurance_simulation, heir_base_acquisition, heir_net_proceeds,
};
pub use reapportion::{AcquisitionModel, ClosureModel, reapportion_tax};
pub use solver::{MAX_ANNUAL_GIFT, optimize_gift_amounts};
pub use tables::{MAX_AMOUNT, MAX_GIFT_YEARS, QUICK_TABLE_MAX_ROWS, basic_deduction};
pub use types::{
    CashGiftSimulationResult, ComparisonRow, ContractCategory, DetailedTaxCalculationResult,
    GiftRecipient, GiftRecipientResult, GiftScenarioResult, Heir, HeirCensus, HeirSlot,
    HeirTaxBreakdown, HeirType, HouseholdComposition, InsuranceContract, InsuranceHeirBreakdown,
    InsuranceScenarioResult, InsuranceSimulationResult, SelectedRank, ShareRatio,
    SpouseDeductionDetail, SpouseMode, SpouseModeParseError, TaxCalculationResult,
};
