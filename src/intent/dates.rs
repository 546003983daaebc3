//! Date phrases recognised after an action verb.
//!
//! Works on folded tokens (lowercase, accents stripped, see
//! [`fold`](super::text::fold)). Supported forms:
//!
//! - `aujourd'hui`, `today`, `demain`, `tomorrow`, `apres-demain`
//! - `dans N jours|semaines`, `in N days|weeks` (`un`, `une`, `a` count as 1)
//! - weekday names, optionally `lundi prochain` or `next monday`
//! - `dd/mm/yyyy`, `dd/mm`, `yyyy-mm-dd`

use chrono::{NaiveDate, Weekday};

use crate::models::DueDate;

/// Upper bound for `dans N jours` so that resolution cannot overflow
const MAX_OFFSET_DAYS: u32 = 3650;

/// Try to read a date phrase starting at `tokens[start]`.
///
/// Returns the date and the number of tokens it spans.
pub fn parse_date_at(tokens: &[String], start: usize) -> Option<(DueDate, usize)> {
    let first = tokens.get(start)?.as_str();
    let second = tokens.get(start + 1).map(String::as_str);

    match first {
        "aujourd'hui" | "aujourdhui" | "today" => {
            return Some((DueDate::InDays { days: 0 }, 1));
        }
        "demain" | "tomorrow" => return Some((DueDate::InDays { days: 1 }, 1)),
        "apres-demain" | "apresdemain" => return Some((DueDate::InDays { days: 2 }, 1)),
        "apres" if second == Some("demain") => return Some((DueDate::InDays { days: 2 }, 2)),
        "dans" | "in" => return parse_offset(tokens, start),
        "next" => {
            let weekday = second.and_then(parse_weekday)?;
            return Some((DueDate::NextWeekday { weekday }, 2));
        }
        _ => {}
    }

    if let Some(weekday) = parse_weekday(first) {
        let span = if second == Some("prochain") { 2 } else { 1 };
        return Some((DueDate::NextWeekday { weekday }, span));
    }

    parse_numeric_date(first).map(|date| (date, 1))
}

fn parse_offset(tokens: &[String], start: usize) -> Option<(DueDate, usize)> {
    let amount = parse_amount(tokens.get(start + 1)?)?;
    let unit = tokens.get(start + 2)?.as_str();
    let multiplier = match unit {
        "jour" | "jours" | "j" | "day" | "days" => 1,
        "semaine" | "semaines" | "week" | "weeks" => 7,
        _ => return None,
    };

    let days = amount.checked_mul(multiplier)?;
    if days > MAX_OFFSET_DAYS {
        return None;
    }
    Some((DueDate::InDays { days }, 3))
}

fn parse_amount(token: &str) -> Option<u32> {
    match token {
        "un" | "une" | "a" | "one" => Some(1),
        "deux" | "two" => Some(2),
        "trois" | "three" => Some(3),
        _ => token.parse().ok(),
    }
}

fn parse_weekday(token: &str) -> Option<Weekday> {
    let weekday = match token {
        "lundi" | "monday" => Weekday::Mon,
        "mardi" | "tuesday" => Weekday::Tue,
        "mercredi" | "wednesday" => Weekday::Wed,
        "jeudi" | "thursday" => Weekday::Thu,
        "vendredi" | "friday" => Weekday::Fri,
        "samedi" | "saturday" => Weekday::Sat,
        "dimanche" | "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

fn parse_numeric_date(token: &str) -> Option<DueDate> {
    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return Some(DueDate::On { date });
    }

    let parts: Vec<&str> = token.split('/').collect();
    match parts.as_slice() {
        [day, month, year] if year.len() == 4 => {
            let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
            Some(DueDate::On { date })
        }
        [day, month] => {
            let day: u32 = day.parse().ok()?;
            let month: u32 = month.parse().ok()?;
            // 2000 is a leap year, so 29/02 is accepted
            NaiveDate::from_ymd_opt(2000, month, day)?;
            Some(DueDate::DayOfMonth { day, month })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<String> {
        input.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_relative_keywords() {
        assert_eq!(parse_date_at(&tokens("demain"), 0), Some((DueDate::InDays { days: 1 }, 1)));
        assert_eq!(parse_date_at(&tokens("today"), 0), Some((DueDate::InDays { days: 0 }, 1)));
        assert_eq!(
            parse_date_at(&tokens("apres demain"), 0),
            Some((DueDate::InDays { days: 2 }, 2))
        );
    }

    #[test]
    fn test_offsets() {
        assert_eq!(
            parse_date_at(&tokens("dans 3 jours"), 0),
            Some((DueDate::InDays { days: 3 }, 3))
        );
        assert_eq!(
            parse_date_at(&tokens("dans une semaine"), 0),
            Some((DueDate::InDays { days: 7 }, 3))
        );
        assert_eq!(
            parse_date_at(&tokens("in 2 weeks"), 0),
            Some((DueDate::InDays { days: 14 }, 3))
        );
        assert_eq!(parse_date_at(&tokens("dans 3 mois"), 0), None);
        assert_eq!(parse_date_at(&tokens("dans 99999 jours"), 0), None);
        assert_eq!(parse_date_at(&tokens("dans"), 0), None);
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(
            parse_date_at(&tokens("vendredi"), 0),
            Some((DueDate::NextWeekday { weekday: Weekday::Fri }, 1))
        );
        assert_eq!(
            parse_date_at(&tokens("lundi prochain"), 0),
            Some((DueDate::NextWeekday { weekday: Weekday::Mon }, 2))
        );
        assert_eq!(
            parse_date_at(&tokens("next tuesday"), 0),
            Some((DueDate::NextWeekday { weekday: Weekday::Tue }, 2))
        );
    }

    #[test]
    fn test_numeric_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        assert_eq!(
            parse_date_at(&tokens("12/03/2025"), 0),
            Some((DueDate::On { date: expected }, 1))
        );
        assert_eq!(
            parse_date_at(&tokens("2025-03-12"), 0),
            Some((DueDate::On { date: expected }, 1))
        );
        assert_eq!(
            parse_date_at(&tokens("29/02"), 0),
            Some((DueDate::DayOfMonth { day: 29, month: 2 }, 1))
        );
        assert_eq!(parse_date_at(&tokens("32/01"), 0), None);
        assert_eq!(parse_date_at(&tokens("31/02/2025"), 0), None);
    }

    #[test]
    fn test_start_offset_and_non_dates() {
        let input = tokens("jean demain");
        assert_eq!(parse_date_at(&input, 0), None);
        assert_eq!(parse_date_at(&input, 1), Some((DueDate::InDays { days: 1 }, 1)));
        assert_eq!(parse_date_at(&input, 5), None);
    }
}
