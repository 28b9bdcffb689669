//! Statutory constants. Amounts are in man-en.

use super::types::{LegalShareRatios, ShareRatio, TaxBracket};

const fn bracket(threshold: i64, rate: i64, deduction: i64) -> TaxBracket {
    TaxBracket {
        threshold: Some(threshold),
        rate,
        deduction,
    }
}

const fn top_bracket(rate: i64, deduction: i64) -> TaxBracket {
    TaxBracket {
        threshold: None,
        rate,
        deduction,
    }
}

/// Quick-reference table applied to each legal-share amount.
pub static INHERITANCE_TAX_BRACKETS: [TaxBracket; 8] = [
    bracket(1_000, 10, 0),
    bracket(3_000, 15, 50),
    bracket(5_000, 20, 200),
    bracket(10_000, 30, 700),
    bracket(20_000, 40, 1_700),
    bracket(30_000, 45, 2_700),
    bracket(60_000, 50, 4_200),
    top_bracket(55, 7_200),
];

/// Special-rate gift tax (lineal ascendant to adult descendant), applied
/// after the annual basic exemption.
pub static SPECIAL_GIFT_TAX_BRACKETS: [TaxBracket; 8] = [
    bracket(200, 10, 0),
    bracket(400, 15, 10),
    bracket(600, 20, 30),
    bracket(1_000, 30, 90),
    bracket(1_500, 40, 190),
    bracket(3_000, 45, 265),
    bracket(4_500, 50, 415),
    top_bracket(55, 640),
];

pub const BASIC_DEDUCTION_BASE: i64 = 3_000;
pub const BASIC_DEDUCTION_PER_HEIR: i64 = 600;

/// Third-rank heirs pay 20% on top of their apportioned tax.
pub const THIRD_RANK_SURCHARGE_PERCENT: i64 = 20;

/// Spouse relief covers acquisitions up to this amount (or the legal share
/// if larger).
pub const SPOUSE_DEDUCTION_LIMIT: i64 = 16_000;

pub const GIFT_TAX_BASIC_EXEMPTION: i64 = 110;

/// Tax-exempt life-insurance proceeds per statutory heir.
pub const INSURANCE_EXEMPT_PER_HEIR: i64 = 500;

pub const QUICK_TABLE_MIN: i64 = 5_000;
pub const QUICK_TABLE_MAX: i64 = 100_000;
pub const QUICK_TABLE_STEP: i64 = 500;
pub const QUICK_TABLE_MAX_ROWS: i64 = 2_000;

pub const HIGHLIGHT_INTERVAL: i64 = 10_000;

/// Largest amount accepted from callers (one trillion yen).
pub const MAX_AMOUNT: i64 = 100_000_000;
pub const MAX_GIFT_YEARS: i64 = 100;

/// Legal share split between the spouse and the whole of the other heirs.
pub fn legal_share_ratios(has_spouse: bool, rank: u8) -> LegalShareRatios {
    if !has_spouse {
        return LegalShareRatios {
            spouse: ShareRatio::ZERO,
            others: ShareRatio::WHOLE,
        };
    }
    match rank {
        1 => LegalShareRatios {
            spouse: ShareRatio::new(1, 2),
            others: ShareRatio::new(1, 2),
        },
        2 => LegalShareRatios {
            spouse: ShareRatio::new(2, 3),
            others: ShareRatio::new(1, 3),
        },
        3 => LegalShareRatios {
            spouse: ShareRatio::new(3, 4),
            others: ShareRatio::new(1, 4),
        },
        _ => LegalShareRatios {
            spouse: ShareRatio::WHOLE,
            others: ShareRatio::ZERO,
        },
    }
}

pub fn basic_deduction(total_heirs_count: usize) -> i64 {
    BASIC_DEDUCTION_BASE + BASIC_DEDUCTION_PER_HEIR * total_heirs_count as i64
}

/// `floor(amount * percent / 100)`.
pub fn percent_of(amount: i64, percent: i64) -> i64 {
    saturate(mul_wide(amount, percent).div_euclid(100))
}

/// `floor(amount * numerator / denominator)`, 0 for a non-positive denominator.
pub fn pro_rata(amount: i64, numerator: i64, denominator: i64) -> i64 {
    if denominator <= 0 {
        return 0;
    }
    saturate(mul_wide(amount, numerator).div_euclid(denominator as i128))
}

pub(crate) fn mul_wide(a: i64, b: i64) -> i128 {
    a as i128 * b as i128
}

/// Narrows back to i64, pinning at the bounds instead of wrapping.
pub(crate) fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

pub fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values.into_iter().fold(0, i64::saturating_add)
}

pub fn rate_percent(amount: i64, denominator: i64) -> f64 {
    if denominator <= 0 {
        return 0.0;
    }
    amount as f64 / denominator as f64 * 100.0
}
