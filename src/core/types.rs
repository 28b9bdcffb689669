use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeirType {
    Spouse,
    Child,
    Grandchild,
    Parent,
    Grandparent,
    Sibling,
    #[serde(alias = "nephewNiece")]
    NephewNiece,
}

impl HeirType {
    pub fn display_name(self) -> &'static str {
        match self {
            HeirType::Spouse => "Spouse",
            HeirType::Child => "Child",
            HeirType::Grandchild => "Grandchild",
            HeirType::Parent => "Parent",
            HeirType::Grandparent => "Grandparent",
            HeirType::Sibling => "Sibling",
            HeirType::NephewNiece => "Nephew/Niece",
        }
    }
}

/// A primary heir. `representatives` only matter when the heir predeceased;
/// they are never expanded further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heir {
    pub id: String,
    #[serde(rename = "type")]
    pub heir_type: HeirType,
    #[serde(default)]
    pub is_deceased: bool,
    #[serde(default)]
    pub representatives: Vec<Heir>,
}

impl Heir {
    pub fn living(id: impl Into<String>, heir_type: HeirType) -> Self {
        Self {
            id: id.into(),
            heir_type,
            is_deceased: false,
            representatives: Vec::new(),
        }
    }

    pub fn deceased(id: impl Into<String>, heir_type: HeirType, representatives: Vec<Heir>) -> Self {
        Self {
            id: id.into(),
            heir_type,
            is_deceased: true,
            representatives,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectedRank {
    #[default]
    None,
    Rank1,
    Rank2,
    Rank3,
}

/// Household as entered by the user. Only the list matching `selected_rank`
/// is live; the other two may hold stale entries and are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HouseholdComposition {
    pub has_spouse: bool,
    pub selected_rank: SelectedRank,
    pub rank1_children: Vec<Heir>,
    pub rank2_ascendants: Vec<Heir>,
    pub rank3_siblings: Vec<Heir>,
}

impl HouseholdComposition {
    pub fn active_list(&self) -> &[Heir] {
        match self.selected_rank {
            SelectedRank::None => &[],
            SelectedRank::Rank1 => &self.rank1_children,
            SelectedRank::Rank2 => &self.rank2_ascendants,
            SelectedRank::Rank3 => &self.rank3_siblings,
        }
    }

    pub fn without_spouse(&self) -> Self {
        Self {
            has_spouse: false,
            ..self.clone()
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TaxBracket {
    /// Upper bound of the bracket; `None` for the open-ended top bracket.
    pub threshold: Option<i64>,
    pub rate: i64,
    pub deduction: i64,
}

/// Exact statutory fraction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ShareRatio {
    pub numerator: i64,
    pub denominator: i64,
}

impl ShareRatio {
    pub const ZERO: ShareRatio = ShareRatio::new(0, 1);
    pub const WHOLE: ShareRatio = ShareRatio::new(1, 1);

    pub const fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `floor(amount * ratio)`.
    pub fn of(self, amount: i64) -> i64 {
        if self.denominator <= 0 {
            return 0;
        }
        let scaled = amount as i128 * self.numerator as i128;
        scaled
            .div_euclid(self.denominator as i128)
            .clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn is_zero(self) -> bool {
        self.numerator == 0
    }

    pub fn as_f64(self) -> f64 {
        if self.denominator <= 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LegalShareRatios {
    pub spouse: ShareRatio,
    pub others: ShareRatio,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SpouseMode {
    #[default]
    Legal,
    #[serde(rename = "limit160m")]
    Limit160m,
    Custom {
        value: i64,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpouseModeParseError {
    #[error("unknown spouse mode `{0}` (expected legal, limit160m or custom:<amount>)")]
    UnknownMode(String),
    #[error("invalid custom spouse amount `{0}`")]
    InvalidAmount(String),
}

impl FromStr for SpouseMode {
    type Err = SpouseModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "legal" => return Ok(SpouseMode::Legal),
            "limit160m" => return Ok(SpouseMode::Limit160m),
            _ => {}
        }
        let Some(raw) = trimmed.strip_prefix("custom:") else {
            return Err(SpouseModeParseError::UnknownMode(trimmed.to_string()));
        };
        raw.trim()
            .parse::<i64>()
            .map(|value| SpouseMode::Custom { value })
            .map_err(|_| SpouseModeParseError::InvalidAmount(raw.to_string()))
    }
}

impl fmt::Display for SpouseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpouseMode::Legal => write!(f, "legal"),
            SpouseMode::Limit160m => write!(f, "limit160m"),
            SpouseMode::Custom { value } => write!(f, "custom:{value}"),
        }
    }
}

/// One tax-relevant person after substitution has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeirSlot {
    pub heir_id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub heir_type: HeirType,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeirCensus {
    pub rank: u8,
    pub total_heirs_count: usize,
    pub rank_heirs_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationResult {
    pub estate_value: i64,
    pub basic_deduction: i64,
    pub taxable_amount: i64,
    pub total_tax: i64,
    pub tax_after_spouse_deduction: i64,
    pub effective_tax_rate: f64,
    pub effective_tax_rate_after_spouse: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeirTaxBreakdown {
    pub heir_id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub heir_type: HeirType,
    pub legal_share_ratio: f64,
    pub legal_share_amount: i64,
    pub tax_on_share: i64,
    pub acquisition_amount: i64,
    pub proportional_tax: i64,
    pub surcharge_amount: i64,
    pub spouse_deduction: i64,
    pub final_tax: i64,
}

impl HeirTaxBreakdown {
    pub fn is_spouse(&self) -> bool {
        self.heir_type == HeirType::Spouse
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpouseDeductionDetail {
    pub acquisition_amount: i64,
    pub legal_share_amount: i64,
    pub limit160m: i64,
    pub deduction_limit: i64,
    pub tax_before_deduction: i64,
    pub actual_deduction: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedTaxCalculationResult {
    pub estate_value: i64,
    pub basic_deduction: i64,
    pub taxable_amount: i64,
    pub total_tax: i64,
    pub heir_breakdowns: Vec<HeirTaxBreakdown>,
    pub spouse_deduction_detail: Option<SpouseDeductionDetail>,
    pub total_final_tax: i64,
    pub effective_tax_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftRecipient {
    pub id: String,
    pub heir_id: String,
    #[serde(default)]
    pub heir_label: String,
    pub annual_amount: i64,
    pub years: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftRecipientResult {
    pub id: String,
    pub heir_id: String,
    pub heir_label: String,
    pub annual_amount: i64,
    pub years: i64,
    pub taxable_amount_per_year: i64,
    pub gift_tax_per_year: i64,
    pub total_gift: i64,
    pub total_gift_tax: i64,
    pub net_gift: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftScenarioResult {
    pub label: String,
    pub estate_value: i64,
    pub tax_result: DetailedTaxCalculationResult,
    pub total_net_proceeds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashGiftSimulationResult {
    pub current: GiftScenarioResult,
    pub proposed: GiftScenarioResult,
    pub recipient_results: Vec<GiftRecipientResult>,
    pub total_gifts: i64,
    pub total_gift_tax: i64,
    pub inheritance_tax_saving: i64,
    pub net_proceeds_diff: i64,
    pub base_estate: i64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractCategory {
    Existing,
    New,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceContract {
    pub id: String,
    pub category: ContractCategory,
    pub beneficiary_id: String,
    #[serde(default)]
    pub beneficiary_label: String,
    pub benefit: i64,
    #[serde(default)]
    pub premium: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceHeirBreakdown {
    pub heir_id: String,
    pub label: String,
    pub total_benefit: i64,
    pub non_taxable_amount: i64,
    pub taxable_amount: i64,
    pub premium_paid: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceScenarioResult {
    pub label: String,
    pub total_benefit: i64,
    pub non_taxable_limit: i64,
    pub non_taxable_amount: i64,
    pub taxable_insurance: i64,
    pub adjusted_estate: i64,
    pub premium_deduction: i64,
    pub total_net_proceeds: i64,
    pub tax_result: DetailedTaxCalculationResult,
    pub heir_breakdowns: Vec<InsuranceHeirBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceSimulationResult {
    pub current: InsuranceScenarioResult,
    pub proposed: InsuranceScenarioResult,
    pub tax_saving: i64,
    pub net_proceeds_diff: i64,
    pub new_premium_total: i64,
    pub base_estate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub ratio: i64,
    pub spouse_acquisition: i64,
    pub first_tax: i64,
    pub second_estate: i64,
    pub second_tax: i64,
    pub total_tax: i64,
    pub first_breakdowns: Vec<HeirTaxBreakdown>,
    pub second_breakdowns: Vec<HeirTaxBreakdown>,
}
