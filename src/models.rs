use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weekday labels as stored in `selectedDays`, indexed by days from Sunday.
pub const DAYS_OF_WEEK: [&str; 7] = ["Sun", "Mon", "Tues", "Wed", "Thurs", "Fri", "Sat"];

pub fn weekday_label(weekday: Weekday) -> &'static str {
    DAYS_OF_WEEK[weekday.num_days_from_sunday() as usize]
}

/// Formats a date as the `dd.MM` key that joins days to payment records.
///
/// The key has no year, so the same calendar date in two different years
/// maps to the same record.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%d.%m").to_string()
}

/// Parses a `dd.MM` key into `(day, month)`.
pub fn parse_day_key(key: &str) -> Option<(u32, u32)> {
    let (day, month) = key.split_once('.')?;
    if day.len() != 2 || month.len() != 2 {
        return None;
    }
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    // 2000 is a leap year, so 29.02 is accepted.
    NaiveDate::from_ymd_opt(2000, month, day)?;
    Some((day, month))
}

/// Resolves a `dd.MM` key in the given year.
pub fn date_in_year(key: &str, year: i32) -> Option<NaiveDate> {
    let (day, month) = parse_day_key(key)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SelectedDays(pub BTreeMap<String, bool>);

impl SelectedDays {
    /// Unknown or missing labels count as not selected.
    pub fn is_selected(&self, weekday: Weekday) -> bool {
        self.0.get(weekday_label(weekday)).copied().unwrap_or(false)
    }

    pub fn none() -> Self {
        Self(
            DAYS_OF_WEEK
                .iter()
                .map(|label| (label.to_string(), false))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOption {
    #[serde(rename = "paymentName")]
    pub name: String,
    #[serde(rename = "paymentCost")]
    pub cost: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub selected_days: SelectedDays,
    pub possible_payments: Vec<PaymentOption>,
    pub total_price: String,
}

impl Default for Configuration {
    /// What a fresh setup form starts with.
    fn default() -> Self {
        Self {
            selected_days: SelectedDays::none(),
            possible_payments: vec![PaymentOption {
                name: "Double".to_string(),
                cost: "140".to_string(),
            }],
            total_price: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payment {
    Skipped,
    Payed {
        value: String,
    },
    Moved {
        value: String,
        #[serde(rename = "movedTo")]
        moved_to: String,
    },
}

impl Payment {
    /// Money attached to the payment; `Skipped` has none.
    pub fn value(&self) -> Option<&str> {
        match self {
            Payment::Skipped => None,
            Payment::Payed { value } | Payment::Moved { value, .. } => Some(value),
        }
    }

    pub fn message(&self) -> String {
        match self.value() {
            None => "Skipped".to_string(),
            Some(value) => format!("Payed: {value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub day: String,
    pub payment: Payment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Skipped,
    Payed,
    Moved,
}

/// Body of a payment submission, shared by the JSON API and the HTML form.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub day: String,
    #[serde(rename = "type")]
    pub kind: Option<PaymentKind>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub moved_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LastPaymentRequest {
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub day: String,
    pub date: String,
    pub weekday: String,
    pub is_paid: bool,
    pub is_moved: bool,
    pub payment: Option<Payment>,
    pub message: Option<String>,
    pub moved_to_weekday: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub day_of_last_payment: Option<String>,
    pub money_left: String,
    pub days: Vec<ScheduleDay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_sunday_first_order() {
        assert_eq!(weekday_label(Weekday::Sun), "Sun");
        assert_eq!(weekday_label(Weekday::Tue), "Tues");
        assert_eq!(weekday_label(Weekday::Thu), "Thurs");
        assert_eq!(weekday_label(Weekday::Sat), "Sat");
    }

    #[test]
    fn day_key_is_zero_padded_day_then_month() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(day_key(date), "05.03");
        assert_eq!(parse_day_key("05.03"), Some((5, 3)));
        assert_eq!(parse_day_key("5.3"), None);
        assert_eq!(parse_day_key("31.02"), None);
        assert_eq!(parse_day_key("29.02"), Some((29, 2)));
    }

    #[test]
    fn payment_uses_tagged_storage_format() {
        let record: PaymentRecord = serde_json::from_str(
            r#"{"day":"07.03","payment":{"type":"moved","value":"50","movedTo":"09.03"}}"#,
        )
        .unwrap();
        assert_eq!(
            record.payment,
            Payment::Moved {
                value: "50".to_string(),
                moved_to: "09.03".to_string()
            }
        );

        let skipped = serde_json::to_value(Payment::Skipped).unwrap();
        assert_eq!(skipped, serde_json::json!({ "type": "skipped" }));
    }

    #[test]
    fn configuration_uses_camel_case_keys() {
        let config = Configuration::default();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["possiblePayments"][0]["paymentName"], "Double");
        assert_eq!(value["possiblePayments"][0]["paymentCost"], "140");
        assert_eq!(value["selectedDays"]["Thurs"], false);
        assert_eq!(value["totalPrice"], "");
    }

    #[test]
    fn payment_messages() {
        assert_eq!(Payment::Skipped.message(), "Skipped");
        let payed = Payment::Payed {
            value: "140".to_string(),
        };
        assert_eq!(payed.message(), "Payed: 140");
    }
}
