use serde::{Deserialize, Serialize};

use crate::domain::tour::TourId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub i64);

/// Integer field that clients send either as a JSON number or a numeric string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseInteger {
    Number(serde_json::Number),
    Text(String),
}

impl LooseInteger {
    /// Leading-integer interpretation: `"3 guests"` is 3, `"abc"` is nothing,
    /// fractional numbers truncate toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(number) => number.as_i64().or_else(|| {
                number.as_f64().filter(|value| value.is_finite()).map(|value| value.trunc() as i64)
            }),
            Self::Text(text) => leading_integer(text),
        }
    }
}

impl From<i64> for LooseInteger {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|value| sign * value)
}

/// One booking form value exactly as the client sent it. Every JSON type is
/// accepted here so a mistyped field is reported by its own validation message.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct FormField(serde_json::Value);

impl FormField {
    /// Untrimmed text of a truthy scalar: a non-empty string, a non-zero number,
    /// or `true`. Everything else counts as not provided.
    pub fn raw(&self) -> Option<String> {
        match &self.0 {
            serde_json::Value::String(text) if !text.is_empty() => Some(text.clone()),
            serde_json::Value::Number(number) if number.as_f64() != Some(0.0) => {
                Some(number.to_string())
            }
            serde_json::Value::Bool(true) => Some("true".to_owned()),
            _ => None,
        }
    }

    /// Trimmed, non-blank text.
    pub fn text(&self) -> Option<String> {
        self.raw().map(|text| text.trim().to_owned()).filter(|text| !text.is_empty())
    }

    /// Only a JSON string reads as a string; `20250720` is not `"20250720"`.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Leading-integer reading of numbers and strings; other types have none.
    pub fn as_i64(&self) -> Option<i64> {
        match &self.0 {
            serde_json::Value::Number(number) => LooseInteger::Number(number.clone()).as_i64(),
            serde_json::Value::String(text) => leading_integer(text),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for FormField {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl From<&str> for FormField {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<i64> for FormField {
    fn from(value: i64) -> Self {
        Self(value.into())
    }
}

/// Raw booking submission as it arrives over HTTP.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub tour_id: Option<FormField>,
    pub first_name: Option<FormField>,
    pub last_name: Option<FormField>,
    pub email: Option<FormField>,
    pub phone: Option<FormField>,
    pub date: Option<FormField>,
    pub guests: Option<FormField>,
    pub special_requests: Option<FormField>,
}

/// A submission that passed validation and is ready to persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingDraft {
    pub tour_id: TourId,
    pub tour_title: String,
    pub first_name: String,
    pub last_name: String,
    /// Trimmed and lowercased; the identity key for users.
    pub email: String,
    pub phone: String,
    pub date: String,
    pub guests: u32,
    pub special_requests: String,
    pub total_price: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingContact {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// A stored booking together with the user it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub tour_id: TourId,
    pub tour_title: String,
    pub date: String,
    pub guests: u32,
    pub special_requests: String,
    pub total_price: i64,
    pub created_at: String,
    pub user: BookingContact,
}

/// Flat row shape used when listing bookings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub id: BookingId,
    pub tour_id: TourId,
    pub tour_title: String,
    pub date: String,
    pub guests: u32,
    pub special_requests: String,
    pub total_price: i64,
    pub created_at: String,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<Booking> for BookingSummary {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            tour_id: booking.tour_id,
            tour_title: booking.tour_title,
            date: booking.date,
            guests: booking.guests,
            special_requests: booking.special_requests,
            total_price: booking.total_price,
            created_at: booking.created_at,
            user_id: booking.user_id,
            first_name: booking.user.first_name,
            last_name: booking.user.last_name,
            email: booking.user.email,
            phone: booking.user.phone,
        }
    }
}
