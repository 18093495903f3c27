//! Deterministic keyword rules for quick-add parsing.
//!
//! Every table is evaluated top to bottom and the first hit wins, so order here is behavior:
//! urgency terms sit above "normal", "every day" above the weekday form, and so on.

use std::sync::LazyLock;

use regex::Regex;

use crate::task::{Category, EnergyLevel, Priority, Recurrence};

/// One entry of an ordered rule table.
#[derive(Debug)]
pub struct Rule<T> {
    pub name: &'static str,
    pub pattern: Regex,
    pub value: T,
    pub confidence: f64,
    /// Whether the matched span is cut out of the working text.
    pub consumes: bool,
}

impl<T: Copy> Rule<T> {
    fn new(name: &'static str, pattern: &str, value: T, confidence: f64, consumes: bool) -> Self {
        let pattern = Regex::new(&format!("(?i){pattern}"))
            .unwrap_or_else(|e| panic!("Invalid pattern for rule '{name}': {e}"));
        Self {
            name,
            pattern,
            value,
            confidence,
            consumes,
        }
    }
}

/// First rule in `table` whose pattern occurs in `text`.
pub fn first_match<'a, T>(table: &'a [Rule<T>], text: &str) -> Option<&'a Rule<T>> {
    table.iter().find(|r| r.pattern.is_match(text))
}

const WEEKDAYS: &str = "sunday|monday|tuesday|wednesday|thursday|friday|saturday";
const WEEKDAYS_WITH_SHORT: &str =
    "sunday|monday|tuesday|wednesday|thursday|friday|saturday|sun|mon|tue|wed|thu|fri|sat";

pub static PRIORITY_RULES: LazyLock<Vec<Rule<Priority>>> = LazyLock::new(|| {
    vec![
        Rule::new("urgent", r"\b(urgent|asap|critical|immediately)\b", Priority::Urgent, 0.9, true),
        Rule::new("high", r"\b(high[\s-]?priority|important|high)\b", Priority::High, 0.9, true),
        Rule::new("low", r"\b(low[\s-]?priority|low|minor|someday)\b", Priority::Low, 0.9, true),
        Rule::new("normal", r"\b(normal|medium|mid)\b", Priority::Normal, 0.9, true),
    ]
});

/// Category keywords stay in the title ("gym" in "Morning gym session").
pub static CATEGORY_RULES: LazyLock<Vec<Rule<Category>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "work",
            r"\b(work|office|meeting|report|project|sprint|standup|client|boss)\b",
            Category::Work,
            0.85,
            false,
        ),
        Rule::new(
            "study",
            r"\b(study|learn|course|homework|class|lecture|assignment|exam|quiz)\b",
            Category::Study,
            0.85,
            false,
        ),
        Rule::new(
            "health",
            r"\b(health|gym|workout|doctor|fitness|medical|medicine|run|yoga|exercise)\b",
            Category::Health,
            0.85,
            false,
        ),
        Rule::new(
            "shopping",
            r"\b(shop|shopping|groceries|buy|purchase|order|amazon|mall)\b",
            Category::Shopping,
            0.85,
            false,
        ),
        Rule::new(
            "finance",
            r"\b(finance|bank|bill|tax|invest|expense|budget|payment|rent)\b",
            Category::Finance,
            0.85,
            false,
        ),
        Rule::new(
            "personal",
            r"\b(personal|family|home|house|mom|dad|parents|friend|birthday|wedding)\b",
            Category::Personal,
            0.85,
            false,
        ),
    ]
});

/// Confidence for a category recovered from the cleaned title rather than the raw text.
pub const INFERRED_CATEGORY_CONFIDENCE: f64 = 0.7;

/// The weekday form leaves its span in place so the due-date rules can still read the day.
pub static RECURRENCE_RULES: LazyLock<Vec<Rule<Recurrence>>> = LazyLock::new(|| {
    vec![
        Rule::new("daily", r"\bevery\s+day\b|\bdaily\b", Recurrence::Daily, 0.95, true),
        Rule::new("weekly", r"\bevery\s+week\b|\bweekly\b", Recurrence::Weekly, 0.9, true),
        Rule::new("monthly", r"\bevery\s+month\b|\bmonthly\b", Recurrence::Monthly, 0.9, true),
        Rule::new(
            "every-weekday",
            &format!(r"\bevery\s+({WEEKDAYS_WITH_SHORT})\b"),
            Recurrence::Weekly,
            0.9,
            false,
        ),
    ]
});

/// How a due-date rule turns into a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDateExpr {
    /// Fixed number of days after today.
    DaysAhead(u64),
    /// Next future occurrence of the weekday in capture group 1.
    Weekday,
}

pub static DUE_DATE_RULES: LazyLock<Vec<Rule<DueDateExpr>>> = LazyLock::new(|| {
    vec![
        Rule::new("today", r"\btoday\b", DueDateExpr::DaysAhead(0), 0.95, true),
        Rule::new("tomorrow", r"\btomorrow\b", DueDateExpr::DaysAhead(1), 0.95, true),
        Rule::new("next-week", r"\bnext\s+week\b", DueDateExpr::DaysAhead(7), 0.8, true),
        Rule::new(
            "every-or-next-weekday",
            &format!(r"\b(?:every|next)\s+({WEEKDAYS_WITH_SHORT})\b"),
            DueDateExpr::Weekday,
            0.85,
            true,
        ),
        Rule::new(
            "weekday",
            &format!(r"\b({WEEKDAYS})\b"),
            DueDateExpr::Weekday,
            0.75,
            true,
        ),
    ]
});

pub static ENERGY_RULES: LazyLock<Vec<Rule<EnergyLevel>>> = LazyLock::new(|| {
    vec![
        Rule::new("deep", r"\b(deep\s*work|concentrate|intense)\b", EnergyLevel::Deep, 0.8, true),
        Rule::new("light", r"\b(light|easy|simple|quick)\b", EnergyLevel::Light, 0.7, true),
        Rule::new("low", r"\b(low energy|tired)\b", EnergyLevel::Low, 0.7, true),
    ]
});

// Clock phrases. Captured times go through `time::parse_meridiem_time`.

/// "at 9am to 10:30am"
pub static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\bat\s+(\d{1,2}(?::\d{2})?\s*(?:am|pm))",
        r"\s+to\s+(\d{1,2}(?::\d{2})?\s*(?:am|pm))\b",
    ))
    .expect("Invalid time range pattern")
});

/// "at 3pm", "@ 9:30", "at 15:00"
pub static TIME_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bat|@)\s*(\d{1,2}(?::\d{2})?\s*(?:am|pm)?)\b")
        .expect("Invalid time-at pattern")
});

/// "3pm", "9:30am" with no leading "at"
pub static TIME_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}(?::\d{2})?\s*(?:am|pm))\b").expect("Invalid bare time pattern")
});

pub const TIME_RANGE_CONFIDENCE: f64 = 0.95;
pub const TIME_AT_CONFIDENCE: f64 = 0.9;
pub const TIME_BARE_CONFIDENCE: f64 = 0.8;

/// Longest range that still counts as a same-day duration.
pub const MAX_RANGE_MINUTES: u32 = 12 * 60;

/// "2h", "1 hour", "3 hr"
pub static DURATION_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*(?:hour|hr|h)\b").expect("Invalid hour duration pattern")
});

/// "30 min", "45mins", "10 minutes", "5m"
pub static DURATION_MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*(?:minutes?|mins?|m)\b").expect("Invalid minute duration pattern")
});

pub const DURATION_CONFIDENCE: f64 = 0.9;

#[cfg(test)]
mod tests {
    use super::*;

    fn priority_of(text: &str) -> Option<Priority> {
        first_match(&PRIORITY_RULES, text).map(|r| r.value)
    }

    fn category_of(text: &str) -> Option<Category> {
        first_match(&CATEGORY_RULES, text).map(|r| r.value)
    }

    #[test]
    fn test_all_tables_compile() {
        assert_eq!(PRIORITY_RULES.len(), 4);
        assert_eq!(CATEGORY_RULES.len(), 6);
        assert_eq!(RECURRENCE_RULES.len(), 4);
        assert_eq!(DUE_DATE_RULES.len(), 5);
        assert_eq!(ENERGY_RULES.len(), 3);
        assert!(TIME_RANGE.is_match("at 9am to 10am"));
        assert!(DURATION_MINUTES.is_match("45mins"));
    }

    #[test]
    fn test_urgent_beats_normal_regardless_of_position() {
        assert_eq!(priority_of("normal review, asap"), Some(Priority::Urgent));
    }

    #[test]
    fn test_high_priority_variants() {
        assert_eq!(priority_of("ship it high-priority"), Some(Priority::High));
        assert_eq!(priority_of("HighPriority fix"), Some(Priority::High));
        assert_eq!(priority_of("this is Important"), Some(Priority::High));
    }

    #[test]
    fn test_priority_needs_word_boundaries() {
        assert_eq!(priority_of("follow up on midterm"), None);
        assert_eq!(priority_of("slow cooker"), None);
    }

    #[test]
    fn test_category_table_order() {
        // "work" is checked before "home".
        assert_eq!(category_of("work from home"), Some(Category::Work));
        assert_eq!(category_of("morning gym session"), Some(Category::Health));
        assert_eq!(category_of("pay rent"), Some(Category::Finance));
        assert_eq!(category_of("call grandma"), None);
    }

    #[test]
    fn test_only_the_weekday_recurrence_keeps_its_span() {
        let keeps: Vec<_> = RECURRENCE_RULES
            .iter()
            .filter(|r| !r.consumes)
            .map(|r| r.name)
            .collect();
        assert_eq!(keeps, vec!["every-weekday"]);
        assert!(CATEGORY_RULES.iter().all(|r| !r.consumes));
    }

    #[test]
    fn test_bare_weekday_requires_full_name() {
        let bare = &DUE_DATE_RULES[4];
        assert!(bare.pattern.is_match("gym on Friday"));
        assert!(!bare.pattern.is_match("gym on fri"));
        assert!(DUE_DATE_RULES[3].pattern.is_match("gym next fri"));
    }

    #[test]
    fn test_hour_pattern_does_not_take_plurals() {
        assert!(DURATION_HOURS.is_match("2h"));
        assert!(DURATION_HOURS.is_match("1 hour"));
        assert!(!DURATION_HOURS.is_match("2 hours"));
    }
}
