use crate::models::{
    date_in_year, day_key, Configuration, Payment, PaymentRecord, ScheduleDay, ScheduleResponse,
};
use chrono::{Datelike, Days, Local, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

/// A training day since the last payment, with the record logged for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevantDay<'a> {
    pub date: NaiveDate,
    /// `dd.MM` join key.
    pub day: String,
    pub record: Option<&'a PaymentRecord>,
}

impl RelevantDay<'_> {
    pub fn is_paid(&self) -> bool {
        self.record.is_some()
    }

    pub fn is_moved(&self) -> bool {
        matches!(self.payment(), Some(Payment::Moved { .. }))
    }

    pub fn payment(&self) -> Option<&Payment> {
        self.record.map(|record| &record.payment)
    }

    pub fn weekday(&self) -> String {
        self.date.format("%a").to_string()
    }

    /// Display weekday of the date a moved payment was deferred to, read in
    /// the same year as this day.
    pub fn moved_to_weekday(&self) -> Option<String> {
        match self.payment() {
            Some(Payment::Moved { moved_to, .. }) => date_in_year(moved_to, self.date.year())
                .map(|date| date.format("%a").to_string()),
            _ => None,
        }
    }
}

/// Lazily walks the window `[start, start + len)` and yields the days whose
/// weekday is selected. Nothing is cached: each pass recomputes dates and
/// record lookups.
#[derive(Debug, Clone)]
pub struct RelevantDays<'a> {
    configuration: &'a Configuration,
    records: &'a [PaymentRecord],
    start: NaiveDate,
    offset: u64,
    len: u64,
}

impl<'a> Iterator for RelevantDays<'a> {
    type Item = RelevantDay<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.offset < self.len {
            let Some(date) = self.start.checked_add_days(Days::new(self.offset)) else {
                self.offset = self.len;
                return None;
            };
            self.offset += 1;

            if !self.configuration.selected_days.is_selected(date.weekday()) {
                continue;
            }

            let day = day_key(date);
            let record = self.records.iter().find(|record| record.day == day);
            return Some(RelevantDay { date, day, record });
        }
        None
    }
}

/// Training days from `day_of_last_payment` through `today`, both inclusive.
///
/// Empty when there is no reference date or when it lies after `today`.
pub fn relevant_days<'a>(
    configuration: &'a Configuration,
    day_of_last_payment: Option<NaiveDate>,
    records: &'a [PaymentRecord],
    today: NaiveDate,
) -> RelevantDays<'a> {
    let (start, len) = match day_of_last_payment {
        Some(start) => {
            let diff = (today - start).num_days();
            (start, if diff < 0 { 0 } else { diff as u64 + 1 })
        }
        None => (today, 0),
    };

    RelevantDays {
        configuration,
        records,
        start,
        offset: 0,
        len,
    }
}

/// Budget minus everything paid or moved on the given days. May be negative.
///
/// Totals beyond the `Decimal` range saturate at its bounds.
pub fn money_left<'a, I>(total_price: &str, days: I) -> Decimal
where
    I: IntoIterator<Item = RelevantDay<'a>>,
{
    let spent = days
        .into_iter()
        .filter_map(|day| day.payment().and_then(Payment::value).map(parse_amount))
        .fold(Decimal::ZERO, Decimal::saturating_add);
    parse_amount(total_price).saturating_sub(spent)
}

/// Decimal strings that fail to parse count as zero.
pub fn parse_amount(value: &str) -> Decimal {
    Decimal::from_str(value.trim()).unwrap_or(Decimal::ZERO)
}

pub fn build_schedule(
    configuration: Option<&Configuration>,
    day_of_last_payment: Option<NaiveDate>,
    records: &[PaymentRecord],
) -> ScheduleResponse {
    build_schedule_at(
        Local::now().date_naive(),
        configuration,
        day_of_last_payment,
        records,
    )
}

pub fn build_schedule_at(
    today: NaiveDate,
    configuration: Option<&Configuration>,
    day_of_last_payment: Option<NaiveDate>,
    records: &[PaymentRecord],
) -> ScheduleResponse {
    let day_of_last_payment_label = day_of_last_payment.map(|date| date.to_string());
    let Some(configuration) = configuration else {
        return ScheduleResponse {
            day_of_last_payment: day_of_last_payment_label,
            money_left: Decimal::ZERO.to_string(),
            days: Vec::new(),
        };
    };

    let window = relevant_days(configuration, day_of_last_payment, records, today);
    let left = money_left(&configuration.total_price, window.clone());

    let days = window
        .map(|day| ScheduleDay {
            weekday: day.weekday(),
            is_paid: day.is_paid(),
            is_moved: day.is_moved(),
            moved_to_weekday: day.moved_to_weekday(),
            message: day.payment().map(Payment::message),
            payment: day.payment().cloned(),
            date: day.date.to_string(),
            day: day.day,
        })
        .collect();

    ScheduleResponse {
        day_of_last_payment: day_of_last_payment_label,
        money_left: left.normalize().to_string(),
        days,
    }
}
