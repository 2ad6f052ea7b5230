//! Typed reads and writes of the three persisted records on top of any
//! [`KeyValueStore`].
//!
//! Reads never fail: whatever cannot be decoded is logged and treated as
//! absent. Writes validate their input and report problems as [`AppError`].

use crate::errors::AppError;
use crate::models::{
    day_key, parse_day_key, Configuration, Payment, PaymentKind, PaymentRecord, PaymentRequest,
    DAYS_OF_WEEK,
};
use crate::schedule::relevant_days;
use crate::storage::{KeyValueStore, CONFIGURATION_KEY, DAY_OF_LAST_PAYMENT_KEY, PAYED_DAYS_KEY};
use chrono::{DateTime, Local, NaiveDate, SecondsFormat};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{info, warn};

/// Largest accepted magnitude for a price or payment.
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

pub fn configuration(store: &impl KeyValueStore) -> Option<Configuration> {
    let value = store.get(CONFIGURATION_KEY)?;
    match serde_json::from_value(value.clone()) {
        Ok(configuration) => Some(configuration),
        Err(err) => {
            warn!("ignoring malformed configuration: {err}");
            None
        }
    }
}

/// Replaces the configuration wholesale. Records and the reference date stay.
pub fn save_configuration(
    store: &mut impl KeyValueStore,
    configuration: Configuration,
) -> Result<Configuration, AppError> {
    let configuration = validate_configuration(configuration)?;
    let value = serde_json::to_value(&configuration).map_err(AppError::internal)?;
    store.set(CONFIGURATION_KEY, value);
    info!(
        payments = configuration.possible_payments.len(),
        "configuration saved"
    );
    Ok(configuration)
}

/// Checks a submitted configuration and fills in unselected weekdays.
pub fn validate_configuration(mut configuration: Configuration) -> Result<Configuration, AppError> {
    if let Some(label) = configuration
        .selected_days
        .0
        .keys()
        .find(|label| !DAYS_OF_WEEK.contains(&label.as_str()))
    {
        return Err(AppError::bad_request(format!("unknown weekday '{label}'")));
    }
    for label in DAYS_OF_WEEK {
        configuration
            .selected_days
            .0
            .entry(label.to_string())
            .or_insert(false);
    }

    if configuration.possible_payments.is_empty() {
        return Err(AppError::bad_request("at least one payment option is required"));
    }
    for option in &mut configuration.possible_payments {
        option.name = option.name.trim().to_string();
        option.cost = option.cost.trim().to_string();
        if option.name.is_empty() {
            return Err(AppError::bad_request("payment option name must not be empty"));
        }
        parse_decimal(&option.cost, "payment cost")?;
    }

    configuration.total_price = configuration.total_price.trim().to_string();
    parse_decimal(&configuration.total_price, "total price")?;

    Ok(configuration)
}

/// The payment log. Entries that do not decode are skipped.
pub fn records(store: &impl KeyValueStore) -> Vec<PaymentRecord> {
    let Some(Value::Array(entries)) = store.get(PAYED_DAYS_KEY) else {
        if store.get(PAYED_DAYS_KEY).is_some() {
            warn!("ignoring malformed payment log");
        }
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("skipping malformed payment record: {err}");
                None
            }
        })
        .collect()
}

/// Appends a record for a training day shown since the last payment, as of
/// `today`, that has none yet.
pub fn record_payment(
    store: &mut impl KeyValueStore,
    request: PaymentRequest,
    today: NaiveDate,
) -> Result<PaymentRecord, AppError> {
    let record = payment_from_request(request)?;
    let configuration = configuration(store)
        .ok_or_else(|| AppError::bad_request("save a configuration first"))?;
    let log = records(store);
    let payable = relevant_days(&configuration, day_of_last_payment(store), &log, today)
        .any(|day| day.day == record.day);
    if !payable {
        return Err(AppError::bad_request(format!(
            "day {} is not a training day since the last payment",
            record.day
        )));
    }
    if log.iter().any(|existing| existing.day == record.day) {
        return Err(AppError::conflict(format!(
            "day {} already has a payment",
            record.day
        )));
    }

    let mut entries = match store.get(PAYED_DAYS_KEY) {
        Some(Value::Array(entries)) => entries.clone(),
        _ => Vec::new(),
    };
    entries.push(serde_json::to_value(&record).map_err(AppError::internal)?);
    store.set(PAYED_DAYS_KEY, Value::Array(entries));

    info!(day = %record.day, payment = %record.payment.message(), "payment recorded");
    Ok(record)
}

pub fn payment_from_request(request: PaymentRequest) -> Result<PaymentRecord, AppError> {
    let day = request.day.trim().to_string();
    if parse_day_key(&day).is_none() {
        return Err(AppError::bad_request("day must be formatted as dd.MM"));
    }

    let value = request
        .value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let moved_to = request
        .moved_to
        .map(|moved_to| moved_to.trim().to_string())
        .filter(|moved_to| !moved_to.is_empty());

    let payment = match request.kind {
        None => return Err(AppError::bad_request("payment type is required")),
        Some(PaymentKind::Skipped) => Payment::Skipped,
        Some(PaymentKind::Payed) => Payment::Payed {
            value: required_value(value)?,
        },
        Some(PaymentKind::Moved) => {
            let value = required_value(value)?;
            let moved_to = moved_to
                .as_deref()
                .and_then(moved_to_key)
                .ok_or_else(|| {
                    AppError::bad_request("moved payments need a target date (YYYY-MM-DD or dd.MM)")
                })?;
            Payment::Moved { value, moved_to }
        }
    };

    Ok(PaymentRecord { day, payment })
}

fn required_value(value: Option<String>) -> Result<String, AppError> {
    let value = value.ok_or_else(|| AppError::bad_request("payment value is required"))?;
    parse_decimal(&value, "payment value")?;
    Ok(value)
}

fn moved_to_key(raw: &str) -> Option<String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(day_key(date));
    }
    parse_day_key(raw).map(|_| raw.to_string())
}

fn parse_decimal(value: &str, what: &str) -> Result<Decimal, AppError> {
    let amount = Decimal::from_str(value)
        .map_err(|_| AppError::bad_request(format!("{what} must be a decimal number")))?;
    if amount.abs() > MAX_AMOUNT {
        return Err(AppError::bad_request(format!(
            "{what} must not exceed {MAX_AMOUNT} in magnitude"
        )));
    }
    Ok(amount)
}

pub fn day_of_last_payment(store: &impl KeyValueStore) -> Option<NaiveDate> {
    let value = store.get(DAY_OF_LAST_PAYMENT_KEY)?;
    let parsed = value.as_str().and_then(parse_reference_date);
    if parsed.is_none() {
        warn!("ignoring malformed day of last payment: {value}");
    }
    parsed
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp, which is read
/// in local time.
pub fn parse_reference_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|instant| instant.with_timezone(&Local).date_naive())
}

pub fn set_day_of_last_payment(
    store: &mut impl KeyValueStore,
    raw: &str,
) -> Result<NaiveDate, AppError> {
    let date = parse_reference_date(raw)
        .ok_or_else(|| AppError::bad_request("date must be YYYY-MM-DD or an RFC 3339 timestamp"))?;
    store.set(DAY_OF_LAST_PAYMENT_KEY, Value::String(raw.trim().to_string()));
    info!(%date, "day of last payment set");
    Ok(date)
}

/// Starts a new billing window at `now`.
pub fn mark_just_paid(store: &mut impl KeyValueStore, now: DateTime<Local>) -> NaiveDate {
    store.set(
        DAY_OF_LAST_PAYMENT_KEY,
        Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, false)),
    );
    let date = now.date_naive();
    info!(%date, "marked as just paid");
    date
}

/// Forgets the configuration, the payment log and the reference date.
pub fn reset(store: &mut impl KeyValueStore) {
    store.remove(CONFIGURATION_KEY);
    store.remove(PAYED_DAYS_KEY);
    store.remove(DAY_OF_LAST_PAYMENT_KEY);
    info!("configuration reset");
}
