//! Trip and itinerary domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Trip request rejected before anything is stored or generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Spending tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Budget,
    #[default]
    Medium,
    Luxury,
}

impl Budget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Budget::Budget => "budget",
            Budget::Medium => "medium",
            Budget::Luxury => "luxury",
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Budget {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "budget" => Ok(Budget::Budget),
            "medium" => Ok(Budget::Medium),
            "luxury" => Ok(Budget::Luxury),
            other => Err(ValidationError(format!("unknown budget tier: {other}"))),
        }
    }
}

/// Activity density.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Relaxed,
    #[default]
    Moderate,
    Busy,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Relaxed => "relaxed",
            Pace::Moderate => "moderate",
            Pace::Busy => "busy",
        }
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pace {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relaxed" => Ok(Pace::Relaxed),
            "moderate" => Ok(Pace::Moderate),
            "busy" => Ok(Pace::Busy),
            other => Err(ValidationError(format!("unknown pace: {other}"))),
        }
    }
}

/// Raw trip request as submitted by a client. Optional fields get defaults
/// during validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequestInput {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub travelers: Option<u32>,
    #[serde(default)]
    pub budget: Option<Budget>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub pace: Option<Pace>,
    #[serde(default)]
    pub accommodation: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validated trip request. `duration` is derived from the date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: u32,
    pub travelers: u32,
    pub budget: Budget,
    pub interests: Vec<String>,
    pub pace: Pace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TryFrom<TripRequestInput> for TripRequest {
    type Error = ValidationError;

    fn try_from(input: TripRequestInput) -> Result<Self, Self::Error> {
        let destination = input
            .destination
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ValidationError("Destination is required".into()))?;
        let start_date = input
            .start_date
            .ok_or_else(|| ValidationError("Start date is required".into()))?;
        let end_date = input
            .end_date
            .ok_or_else(|| ValidationError("End date is required".into()))?;
        if end_date <= start_date {
            return Err(ValidationError(
                "End date must be after start date".into(),
            ));
        }
        let duration = u32::try_from((end_date - start_date).num_days())
            .map_err(|_| ValidationError("Trip is too long".into()))?;

        let travelers = input.travelers.unwrap_or(1);
        if travelers == 0 {
            return Err(ValidationError("At least one traveler is required".into()));
        }

        let interests: Vec<String> = input
            .interests
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        if interests.is_empty() {
            return Err(ValidationError("At least one interest is required".into()));
        }

        Ok(Self {
            destination,
            start_date,
            end_date,
            duration,
            travelers,
            budget: input.budget.unwrap_or_default(),
            interests,
            pace: input.pace.unwrap_or_default(),
            accommodation: non_blank(input.accommodation),
            notes: non_blank(input.notes),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Geographic point attached to an activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One scheduled activity within a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, deserialize_with = "lenient_text")]
    pub time: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub kind: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_text"
    )]
    pub location: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_text"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_text"
    )]
    pub notes: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_text"
    )]
    pub price: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_coordinates"
    )]
    pub coordinates: Option<Coordinates>,
}

/// One day of an itinerary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_activities")]
    pub activities: Vec<Activity>,
}

/// Persisted trip aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub request: TripRequest,
    pub itinerary: Vec<ItineraryDay>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Generated model text is loosely typed: accept strings, numbers and
/// booleans for free-text fields; null becomes empty.
fn lenient_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_text(deserializer)?.unwrap_or_default())
}

/// Number, or a string holding one.
fn lenient_number(value: &serde_json::Value) -> Option<f64> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Unusable coordinates are dropped rather than failing the day.
fn lenient_coordinates<'de, D>(deserializer: D) -> Result<Option<Coordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_object().and_then(|obj| {
        Some(Coordinates {
            lat: lenient_number(obj.get("lat")?)?,
            lng: lenient_number(obj.get("lng")?)?,
        })
    }))
}

/// Null or a non-array becomes empty; entries that are not activity
/// objects are skipped.
fn lenient_activities<'de, D>(deserializer: D) -> Result<Vec<Activity>, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Array(items) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> TripRequestInput {
        TripRequestInput {
            destination: Some("Paris".into()),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 13),
            interests: vec!["Food".into()],
            ..Default::default()
        }
    }

    #[test]
    fn derives_duration_and_defaults() {
        let req = TripRequest::try_from(input()).unwrap();
        assert_eq!(req.duration, 3);
        assert_eq!(req.travelers, 1);
        assert_eq!(req.budget, Budget::Medium);
        assert_eq!(req.pace, Pace::Moderate);
        assert!(req.accommodation.is_none());
    }

    #[test]
    fn rejects_blank_destination() {
        let mut i = input();
        i.destination = Some("   ".into());
        assert!(TripRequest::try_from(i).is_err());
    }

    #[test]
    fn rejects_end_before_start() {
        let mut i = input();
        i.end_date = NaiveDate::from_ymd_opt(2024, 1, 10);
        let err = TripRequest::try_from(i).unwrap_err();
        assert!(err.0.contains("after"));
    }

    #[test]
    fn rejects_empty_interests() {
        let mut i = input();
        i.interests = vec![" ".into()];
        assert!(TripRequest::try_from(i).is_err());
    }

    #[test]
    fn rejects_zero_travelers() {
        let mut i = input();
        i.travelers = Some(0);
        assert!(TripRequest::try_from(i).is_err());
    }

    #[test]
    fn input_parses_camel_case_json() {
        let json = r#"{
            "destination": "Kyoto",
            "startDate": "2024-04-01",
            "endDate": "2024-04-05",
            "travelers": 2,
            "budget": "luxury",
            "interests": ["Temples", "Food"],
            "pace": "relaxed",
            "notes": "  "
        }"#;
        let input: TripRequestInput = serde_json::from_str(json).unwrap();
        let req = TripRequest::try_from(input).unwrap();
        assert_eq!(req.duration, 4);
        assert_eq!(req.budget, Budget::Luxury);
        assert_eq!(req.pace, Pace::Relaxed);
        assert!(req.notes.is_none());
    }

    #[test]
    fn activity_accepts_numeric_price_and_missing_fields() {
        let json = r#"{"time": "09:00 AM", "title": "Louvre", "price": 17, "location": null}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.price.as_deref(), Some("17"));
        assert!(activity.location.is_none());
        assert_eq!(activity.kind, "");
    }

    #[test]
    fn enum_round_trip_strings() {
        assert_eq!("busy".parse::<Pace>().unwrap(), Pace::Busy);
        assert_eq!(Budget::Luxury.to_string(), "luxury");
        assert!("lavish".parse::<Budget>().is_err());
    }
}
