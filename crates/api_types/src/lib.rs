use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub mod common {
    use super::*;

    /// Document id as it travels on the wire: `{"$oid": "<24 hex chars>"}`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Oid {
        #[serde(rename = "$oid")]
        pub oid: String,
    }

    impl Oid {
        pub fn new(oid: impl Into<String>) -> Self {
            Self { oid: oid.into() }
        }
    }

    /// Timestamp as emitted by the API: `{"$date": <unix millis>}`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DateJson {
        #[serde(rename = "$date")]
        pub millis: i64,
    }

    impl DateJson {
        pub fn from_utc(value: DateTime<Utc>) -> Self {
            Self {
                millis: value.timestamp_millis(),
            }
        }

        pub fn to_utc(self) -> Option<DateTime<Utc>> {
            Utc.timestamp_millis_opt(self.millis).single()
        }
    }

    /// Timestamp accepted in request bodies.
    ///
    /// Clients send either the extended `{"$date": millis}` form, an RFC 3339
    /// string, or a naive ISO string which is read as UTC.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum TimestampInput {
        Extended(DateJson),
        Rfc3339(DateTime<FixedOffset>),
        Naive(NaiveDateTime),
    }

    impl TimestampInput {
        pub fn to_utc(&self) -> Option<DateTime<Utc>> {
            match self {
                Self::Extended(date) => date.to_utc(),
                Self::Rfc3339(value) => Some(value.with_timezone(&Utc)),
                Self::Naive(value) => Some(value.and_utc()),
            }
        }
    }

    /// Reference to another document inside a request body.
    ///
    /// Either the bare id or the whole referenced document as previously
    /// returned by the API (only its `_id` is read).
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Reference {
        Id(Oid),
        Document {
            #[serde(rename = "_id")]
            id: Oid,
        },
    }

    impl Reference {
        pub fn oid(&self) -> &str {
            match self {
                Self::Id(oid) | Self::Document { id: oid } => &oid.oid,
            }
        }
    }
}

pub mod label {
    use super::common::Oid;
    use super::*;

    /// A pay method or a category.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct LabelView {
        #[serde(rename = "_id")]
        pub id: Oid,
        pub name: String,
        pub active: bool,
        pub instances: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LabelNew {
        pub name: String,
        pub active: Option<bool>,
    }

    /// Partial update. Extra fields (`_id`, `instances`) sent back by clients
    /// are ignored.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LabelUpdate {
        pub name: Option<String>,
        pub active: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LabelQuery {
        pub limit: Option<u64>,
    }
}

pub mod expense {
    use super::common::{DateJson, Oid, Reference, TimestampInput};
    use super::label::LabelView;
    use super::*;

    /// An expense with its references resolved to full documents.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ExpenseView {
        #[serde(rename = "_id")]
        pub id: Oid,
        pub amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        pub pay_method: LabelView,
        pub category: LabelView,
        pub timestamp: DateJson,
        pub active: bool,
        pub one_time: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub amount: f64,
        #[serde(default)]
        pub description: Option<String>,
        pub pay_method: Reference,
        pub category: Reference,
        pub timestamp: TimestampInput,
        #[serde(default)]
        pub active: Option<bool>,
        #[serde(default)]
        pub one_time: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub amount: Option<f64>,
        pub description: Option<String>,
        pub pay_method: Option<Reference>,
        pub category: Option<Reference>,
        pub timestamp: Option<TimestampInput>,
        pub active: Option<bool>,
        pub one_time: Option<bool>,
    }

    /// Query string of `GET /expenses/`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseQuery {
        pub amount: Option<f64>,
        pub pay_method: Option<String>,
        pub category: Option<String>,
        pub limit: Option<u64>,
    }

    /// Query string of `POST /expenses/`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseCreateQuery {
        pub payments: Option<u32>,
    }
}

pub mod chart {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ChartKind {
        Table,
        Bar,
    }

    /// A chart is a list of `[label, value]` rows.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Chart {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: ChartKind,
        pub data: Vec<(String, f64)>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyUpdate {
        pub message: String,
        pub errors: Vec<String>,
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub access_token: String,
    }
}
