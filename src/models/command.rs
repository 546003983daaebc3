use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Entity names extracted by the intent parser.
pub mod entity_keys {
    pub const CALCULATION: &str = "calculation";
    pub const ACTION_VERB: &str = "action_verb";
    pub const TARGET_NAME: &str = "target_name";
    pub const DUE_DATE: &str = "due_date";
    pub const ROUTE: &str = "route";
    pub const QUERY: &str = "query";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Search,
    CreateTask,
    Calculate,
    Navigate,
    Unknown,
}

impl Intent {
    /// Intents that carry a structured action rather than a plain lookup
    pub fn is_structured(self) -> bool {
        matches!(self, Intent::CreateTask | Intent::Calculate | Intent::Navigate)
    }
}

/// Due date as written by the user.
///
/// Relative phrases stay relative so that parsing never depends on the clock;
/// [`DueDate::resolve`] turns them into a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DueDate {
    InDays { days: u32 },
    NextWeekday { weekday: Weekday },
    On { date: NaiveDate },
    DayOfMonth { day: u32, month: u32 },
}

impl DueDate {
    /// Resolve against `today`.
    ///
    /// `NextWeekday` is always strictly after `today`; `DayOfMonth` picks the
    /// next occurrence (today included). Returns `None` when the result does not
    /// exist on the calendar (e.g. 31/02).
    pub fn resolve(&self, today: NaiveDate) -> Option<NaiveDate> {
        match *self {
            DueDate::InDays { days } => today.checked_add_days(Days::new(days as u64)),
            DueDate::NextWeekday { weekday } => {
                let current = today.weekday().num_days_from_monday();
                let target = weekday.num_days_from_monday();
                let delta = (target + 7 - current) % 7;
                let delta = if delta == 0 { 7 } else { delta };
                today.checked_add_days(Days::new(delta as u64))
            }
            DueDate::On { date } => Some(date),
            DueDate::DayOfMonth { day, month } => {
                let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
                match this_year {
                    Some(date) if date >= today => Some(date),
                    _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EntityValue {
    Text(String),
    Number(f64),
    Date(DueDate),
}

impl EntityValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntityValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            EntityValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DueDate> {
        match self {
            EntityValue::Date(date) => Some(date),
            _ => None,
        }
    }
}

/// Result of classifying one piece of free text.
///
/// Produced only by the intent parser and never mutated afterwards. The same
/// `raw_text` always yields an equal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub raw_text: String,
    pub intent: Intent,
    pub confidence: f64,
    pub entities: BTreeMap<String, EntityValue>,
}

impl ParsedCommand {
    pub fn unknown(raw_text: &str) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            intent: Intent::Unknown,
            confidence: 0.0,
            entities: BTreeMap::new(),
        }
    }

    pub fn entity(&self, key: &str) -> Option<&EntityValue> {
        self.entities.get(key)
    }

    /// Evaluated arithmetic result, when the input was a calculation
    pub fn calculation(&self) -> Option<f64> {
        self.entity(entity_keys::CALCULATION).and_then(EntityValue::as_number)
    }

    pub fn due_date(&self) -> Option<&DueDate> {
        self.entity(entity_keys::DUE_DATE).and_then(EntityValue::as_date)
    }

    /// Whether the command is strong enough to preempt plain search
    pub fn is_actionable(&self, threshold: f64) -> bool {
        self.intent.is_structured() && self.confidence >= threshold
    }
}
