//! Quick-add parser: one free-text sentence in, a structured task draft out.
//!
//! Stages run in a fixed order over a working copy of the input. Consuming stages cut their
//! matched span out; whatever text survives becomes the title. Nothing here can fail: an
//! unrecognized sentence simply comes back as a bare title.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

use chrono::{DateTime, Days, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::rules::{
    self, DueDateExpr, Rule, CATEGORY_RULES, DUE_DATE_RULES, ENERGY_RULES, PRIORITY_RULES,
    RECURRENCE_RULES,
};
use crate::task::{Category, EnergyLevel, Priority, Recurrence, Task, TaskStatus};
use crate::time::{self, ClockTime, DateProvider};

/// Draft fields that can carry a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    Priority,
    Category,
    DueDate,
    DueTime,
    EstimatedDuration,
    Recurrence,
    EnergyLevel,
}

/// Sparse per-field confidence. A missing key means "not detected", not "zero".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(BTreeMap<DraftField, f64>);

impl Confidence {
    pub fn get(&self, field: DraftField) -> Option<f64> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: DraftField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DraftField, f64)> + '_ {
        self.0.iter().map(|(f, c)| (*f, *c))
    }

    fn set(&mut self, field: DraftField, score: f64) {
        self.0.insert(field, score.clamp(0.0, 1.0));
    }

    fn remove(&mut self, field: DraftField) {
        self.0.remove(&field);
    }
}

/// Coarse reading of a confidence score, for deciding what to ask the user to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ConfidenceLevel::High
        } else if score >= 0.7 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Structured result of parsing one quick-add sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTaskDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<ClockTime>,
    /// Minutes, always positive when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<EnergyLevel>,
    /// Never populated by the parser yet.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub confidence: Confidence,
}

impl ParsedTaskDraft {
    fn bare(title: String) -> Self {
        Self {
            title,
            priority: None,
            category: None,
            due_date: None,
            due_time: None,
            estimated_duration: None,
            recurrence: None,
            energy_level: None,
            tags: Vec::new(),
            confidence: Confidence::default(),
        }
    }

    /// Turn the draft into a task, filling gaps with quick-add defaults
    /// (normal priority, personal category, todo column).
    pub fn into_task(self, id: impl Into<String>, created_at: DateTime<Utc>) -> Task {
        let mut task = Task::new(id, self.title, created_at);
        task.priority = self.priority.unwrap_or_default();
        task.category = self.category.unwrap_or_default();
        task.tags = self.tags;
        task.due_date = self.due_date;
        task.due_time = self.due_time;
        task.estimated_duration = self.estimated_duration;
        task.recurrence = self.recurrence;
        task.energy_level = self.energy_level;
        task.kanban_column = Some(TaskStatus::Todo);
        task
    }
}

/// Parser bound to a source of "today".
#[derive(Debug, Clone)]
pub struct TaskParser<D: DateProvider> {
    dates: D,
}

impl<D: DateProvider> TaskParser<D> {
    pub fn new(dates: D) -> Self {
        Self { dates }
    }

    pub fn parse(&self, input: &str) -> ParsedTaskDraft {
        parse_task(input, self.dates.today())
    }
}

/// Parse `input` with relative dates resolved against `today`.
pub fn parse_task(input: &str, today: NaiveDate) -> ParsedTaskDraft {
    let original = input.trim();
    let mut text = WorkingText::new(original);
    let mut draft = ParsedTaskDraft::bare(String::new());

    // Priority
    if let Some(rule) = apply_rule(&PRIORITY_RULES, &mut text) {
        draft.priority = Some(rule.value);
        draft.confidence.set(DraftField::Priority, rule.confidence);
        debug!(field = "priority", rule = rule.name, "rule matched");
    }
    trace!(stage = "priority", working = text.as_str());

    // Category (non-consuming)
    if let Some(rule) = apply_rule(&CATEGORY_RULES, &mut text) {
        draft.category = Some(rule.value);
        draft.confidence.set(DraftField::Category, rule.confidence);
        debug!(field = "category", rule = rule.name, "rule matched");
    }

    // Recurrence
    if let Some(rule) = apply_rule(&RECURRENCE_RULES, &mut text) {
        draft.recurrence = Some(rule.value);
        draft.confidence.set(DraftField::Recurrence, rule.confidence);
        debug!(field = "recurrence", rule = rule.name, "rule matched");
    }
    trace!(stage = "recurrence", working = text.as_str());

    extract_due_date(&mut text, today, &mut draft);
    trace!(stage = "due_date", working = text.as_str());

    extract_time(&mut text, &mut draft);
    trace!(stage = "time", working = text.as_str());

    extract_duration(&mut text, &mut draft);
    trace!(stage = "duration", working = text.as_str());

    // Energy
    if let Some(rule) = apply_rule(&ENERGY_RULES, &mut text) {
        draft.energy_level = Some(rule.value);
        draft.confidence.set(DraftField::EnergyLevel, rule.confidence);
        debug!(field = "energy_level", rule = rule.name, "rule matched");
    }

    draft.title = finalize_title(text.as_str(), original);
    infer_category_from_title(&mut draft);

    draft
}

/// Second, weaker look for a category in the finished title.
fn infer_category_from_title(draft: &mut ParsedTaskDraft) {
    if draft.category.is_some() {
        return;
    }
    if let Some(rule) = rules::first_match(&CATEGORY_RULES, &draft.title) {
        draft.category = Some(rule.value);
        draft
            .confidence
            .set(DraftField::Category, rules::INFERRED_CATEGORY_CONFIDENCE);
        debug!(field = "category", rule = rule.name, "inferred from title");
    }
}

/// The mutable copy of the input that stages cut spans out of.
#[derive(Debug)]
struct WorkingText(String);

impl WorkingText {
    fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    fn as_str(&self) -> &str {
        &self.0
    }

    /// Drop `span` and re-trim, so later anchors see clean edges.
    fn cut(&mut self, span: Range<usize>) {
        self.0.replace_range(span, "");
        self.0 = self.0.trim().to_string();
    }

    /// Span and first capture group of the leftmost match.
    fn find(&self, re: &Regex) -> Option<(Range<usize>, Option<String>)> {
        let caps = re.captures(&self.0)?;
        let span = caps.get(0)?.range();
        let group = caps.get(1).map(|m| m.as_str().to_string());
        Some((span, group))
    }
}

/// First-match-wins over a rule table, cutting the span when the rule consumes.
fn apply_rule<'a, T>(table: &'a [Rule<T>], text: &mut WorkingText) -> Option<&'a Rule<T>> {
    let rule = rules::first_match(table, text.as_str())?;
    if rule.consumes {
        if let Some((span, _)) = text.find(&rule.pattern) {
            text.cut(span);
        }
    }
    Some(rule)
}

fn extract_due_date(text: &mut WorkingText, today: NaiveDate, draft: &mut ParsedTaskDraft) {
    for rule in DUE_DATE_RULES.iter() {
        let Some((span, group)) = text.find(&rule.pattern) else {
            continue;
        };

        let date = match rule.value {
            DueDateExpr::DaysAhead(n) => today.checked_add_days(Days::new(n)),
            DueDateExpr::Weekday => group
                .as_deref()
                .and_then(time::weekday_from_name)
                .and_then(|wd| time::next_weekday(today, wd)),
        };

        // First hit wins even if the date falls off the calendar; the field just stays unset.
        if let Some(date) = date {
            draft.due_date = Some(date);
            draft.confidence.set(DraftField::DueDate, rule.confidence);
            debug!(field = "due_date", rule = rule.name, %date, "rule matched");
        }
        if rule.consumes {
            text.cut(span);
        }
        return;
    }
}

fn extract_time(text: &mut WorkingText, draft: &mut ParsedTaskDraft) {
    if let Some((span, start, end)) = find_range(text) {
        let start = time::parse_meridiem_time(&start);
        let end = time::parse_meridiem_time(&end);

        if let Some(start) = start {
            draft.due_time = Some(start);
            draft
                .confidence
                .set(DraftField::DueTime, rules::TIME_RANGE_CONFIDENCE);

            if let Some(end) = end {
                let (s, e) = (start.minutes(), end.minutes());
                if e > s && e - s <= rules::MAX_RANGE_MINUTES {
                    draft.estimated_duration = Some(e - s);
                    draft
                        .confidence
                        .set(DraftField::EstimatedDuration, rules::DURATION_CONFIDENCE);
                }
            }
            debug!(field = "due_time", rule = "range", time = %start, "rule matched");
        }
        text.cut(span);
        return;
    }

    if let Some((span, Some(raw))) = text.find(&rules::TIME_AT) {
        if let Some(t) = time::parse_meridiem_time(&raw) {
            draft.due_time = Some(t);
            draft
                .confidence
                .set(DraftField::DueTime, rules::TIME_AT_CONFIDENCE);
            debug!(field = "due_time", rule = "at", time = %t, "rule matched");
            text.cut(span);
            return;
        }
    }

    if let Some((span, Some(raw))) = text.find(&rules::TIME_BARE) {
        if let Some(t) = time::parse_meridiem_time(&raw) {
            draft.due_time = Some(t);
            draft
                .confidence
                .set(DraftField::DueTime, rules::TIME_BARE_CONFIDENCE);
            debug!(field = "due_time", rule = "bare", time = %t, "rule matched");
            text.cut(span);
        }
    }
}

fn find_range(text: &WorkingText) -> Option<(Range<usize>, String, String)> {
    let caps = rules::TIME_RANGE.captures(text.as_str())?;
    Some((
        caps.get(0)?.range(),
        caps.get(1)?.as_str().to_string(),
        caps.get(2)?.as_str().to_string(),
    ))
}

fn extract_duration(text: &mut WorkingText, draft: &mut ParsedTaskDraft) {
    if let Some((span, Some(n))) = text.find(&rules::DURATION_HOURS) {
        let minutes = n.parse::<u32>().ok().and_then(|h| h.checked_mul(60));
        if let Some(minutes) = minutes.filter(|m| *m > 0) {
            draft.estimated_duration = Some(minutes);
            draft
                .confidence
                .set(DraftField::EstimatedDuration, rules::DURATION_CONFIDENCE);
            debug!(field = "estimated_duration", rule = "hours", minutes, "rule matched");
            text.cut(span);
        }
    }

    if let Some((span, Some(n))) = text.find(&rules::DURATION_MINUTES) {
        let total = n
            .parse::<u32>()
            .ok()
            .map(|m| draft.estimated_duration.unwrap_or(0).saturating_add(m));
        if let Some(total) = total.filter(|m| *m > 0) {
            draft.estimated_duration = Some(total);
            draft
                .confidence
                .set(DraftField::EstimatedDuration, rules::DURATION_CONFIDENCE);
            debug!(field = "estimated_duration", rule = "minutes", minutes = total, "rule matched");
            text.cut(span);
        }
    }

    if draft.estimated_duration.is_none() {
        draft.confidence.remove(DraftField::EstimatedDuration);
    }
}

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("Invalid whitespace pattern"));

fn finalize_title(working: &str, original: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(working, " ");
    let title = collapsed.trim_matches(|c: char| c == '-' || c == '–' || c == ',' || c.is_whitespace());
    if title.is_empty() {
        original.to_string()
    } else {
        title.to_string()
    }
}
