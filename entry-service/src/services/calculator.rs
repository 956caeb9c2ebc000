//! Derived field calculator.
//!
//! Each stored field is rounded to two places (half away from zero) before it
//! feeds the next step: weight, then amount, then commission. `total` is the
//! exact sum of the rounded parts, so a stored row always re-derives to itself.

use crate::models::{lenient, BhartiPair, EntryInput, NewEntry, LEGACY_ITEM};
use rust_decimal::{Decimal, RoundingStrategy};
use service_core::error::AppError;
use validator::Validate;

/// Traditional weight unit divisor.
pub const WEIGHT_UNIT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// 1.5 percent.
pub const COMMISSION_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedFields {
    pub weight: Decimal,
    pub amount: Decimal,
    pub commission: Decimal,
    pub total: Decimal,
}

/// Largest magnitude a NUMERIC(10,2) column holds: 99 999 999.99.
pub const MAX_MAGNITUDE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Rounds half away from zero and pins the scale to two places, matching a
/// NUMERIC(10,2) column.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn out_of_range(field: &str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!("{} is out of range", field))
}

/// Rounds and rejects anything a NUMERIC(10,2) column cannot store.
fn column_value(field: &str, value: Decimal) -> Result<Decimal, AppError> {
    let rounded = round2(value);
    if rounded.abs() > MAX_MAGNITUDE {
        return Err(out_of_range(field));
    }
    Ok(rounded)
}

fn column_int(field: &str, value: i64) -> Result<i32, AppError> {
    i32::try_from(value).map_err(|_| out_of_range(field))
}

/// Σ a×b over the pairs, rounded. Order of pairs does not matter. `None` on
/// overflow.
pub fn weight(pairs: &[BhartiPair]) -> Option<Decimal> {
    pairs
        .iter()
        .try_fold(Decimal::ZERO, |sum, p| sum.checked_add(p.a.checked_mul(p.b)?))
        .map(round2)
}

pub fn amount(rate: Decimal, lessrate: Decimal, weight: Decimal) -> Option<Decimal> {
    rate.checked_sub(lessrate)?
        .checked_mul(weight)?
        .checked_div(WEIGHT_UNIT)
        .map(round2)
}

pub fn commission(amount: Decimal) -> Option<Decimal> {
    amount.checked_mul(COMMISSION_RATE).map(round2)
}

pub fn total(amount: Decimal, commission: Decimal, other_amount: i32) -> Option<Decimal> {
    amount
        .checked_add(commission)?
        .checked_add(Decimal::from(other_amount))
        .map(round2)
}

/// Derives all four fields. When pairs are present the supplied weight is
/// ignored; otherwise it is used as given (rounded). Every derived value must
/// fit its column.
pub fn derive(
    rate: Decimal,
    lessrate: Decimal,
    supplied_weight: Decimal,
    other_amount: i32,
    pairs: &[BhartiPair],
) -> Result<DerivedFields, AppError> {
    let weight = if pairs.is_empty() {
        Some(supplied_weight)
    } else {
        weight(pairs)
    };
    let weight = column_value("Weight", weight.ok_or_else(|| out_of_range("Weight"))?)?;

    let amount = amount(rate, lessrate, weight).ok_or_else(|| out_of_range("Amount"))?;
    let amount = column_value("Amount", amount)?;

    let commission = commission(amount).ok_or_else(|| out_of_range("Commission"))?;
    let commission = column_value("Commission", commission)?;

    let total = total(amount, commission, other_amount).ok_or_else(|| out_of_range("Total"))?;
    let total = column_value("Total", total)?;

    Ok(DerivedFields {
        weight,
        amount,
        commission,
        total,
    })
}

/// Turns a request body into a fully derived row.
pub fn prepare_entry(input: EntryInput, actor: &str) -> Result<NewEntry, AppError> {
    input.validate()?;

    let raw_date = input
        .entry_date
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Entry date is required")))?;
    let entry_date = lenient::parse_calendar_date(raw_date).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Invalid entry date: {}", raw_date))
    })?;

    let rate = column_value("Rate", input.rate)?;
    let lessrate = column_value("Less rate", input.lessrate)?;
    if input
        .bharti_pairs
        .iter()
        .any(|p| p.a.abs() > MAX_MAGNITUDE || p.b.abs() > MAX_MAGNITUDE)
    {
        return Err(out_of_range("Bharti pair"));
    }
    let bags = column_int("Bags", input.bags)?;
    let other_amount = column_int("Other amount", input.other_amount)?;
    let market_fee = column_int("Market fee", input.market_fee)?;

    let derived = derive(rate, lessrate, input.weight, other_amount, &input.bharti_pairs)?;

    Ok(NewEntry {
        entry_date,
        name: input.name.trim().to_string(),
        bags,
        bharti_pairs: input.bharti_pairs,
        weight: derived.weight,
        rate,
        lessrate,
        amount: derived.amount,
        commission: derived.commission,
        other_amount,
        total: derived.total,
        quality: input.quality.trim().to_string(),
        item: input.item.unwrap_or_else(|| LEGACY_ITEM.to_string()),
        market_fee,
        actor: actor.to_string(),
    })
}
