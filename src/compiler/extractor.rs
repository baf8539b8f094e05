use crate::compiler::service::{detect_service, Service};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClauseKind {
    Trigger,
    Action,
    Condition,
}

/// 子句: a classified fragment of the description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clause {
    pub kind: ClauseKind,
    pub text: String,
    pub service: Option<Service>,
}

impl Clause {
    pub fn new(kind: ClauseKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            service: detect_service(text),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub trigger: Option<Clause>,
    pub actions: Vec<Clause>,
    pub conditions: Vec<Clause>,
}

/// Pulls the clause text out of a successful match.
pub type CaptureFn = fn(&Captures<'_>) -> Option<String>;

/// One entry of an ordered pattern table.
#[derive(Debug, Clone)]
pub struct ClausePattern {
    pub name: &'static str,
    regex: Regex,
    extract: CaptureFn,
}

impl ClausePattern {
    /// Pattern whose first capture group is the clause.
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Self::with_extractor(name, pattern, first_group)
    }

    pub fn with_extractor(
        name: &'static str,
        pattern: &str,
        extract: CaptureFn,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
            extract,
        })
    }

    fn first_match(&self, text: &str) -> Option<(String, usize, usize)> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;
        let clause = (self.extract)(&caps)?;
        Some((clause, whole.start(), whole.end()))
    }

    fn all_matches(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| (self.extract)(&caps))
            .collect()
    }
}

fn first_group(caps: &Captures<'_>) -> Option<String> {
    let text = caps.get(1)?.as_str().trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn pattern(name: &'static str, regex: &str) -> ClausePattern {
    ClausePattern::new(name, regex).expect("built-in clause pattern")
}

static TRIGGER_PATTERNS: Lazy<Vec<ClausePattern>> = Lazy::new(|| {
    vec![
        pattern("when", r"\bwhen\s+(.+?)\s*(?:\bthen\b|,)"),
        pattern(
            "triggered-by",
            r"\btrigger(?:ed)?\s+(?:by|on|when)\s+(.+?)(?:\s+then\b|,|$)",
        ),
        pattern("starts", r"\bstarts?\s+(?:with|when|on)\s+(.+?)(?:\s+then\b|,|$)"),
        pattern("watches", r"\bwatch(?:es)?\s+(?:for\s+)?(.+?)(?:\s+then\b|,|$)"),
        pattern("monitors", r"\bmonitors?\s+(.+?)(?:\s+then\b|,|$)"),
    ]
});

static CONDITION_PATTERNS: Lazy<Vec<ClausePattern>> = Lazy::new(|| {
    vec![
        pattern("if-then", r"\bif\s+(.+?)\s+then\b"),
        pattern("when-is", r"\bwhen\s+(.+?)\s+(?:is|equals|contains)\b"),
        pattern("check-if", r"\bchecks?\s+(?:if|whether)\s+(.+)"),
    ]
});

static CONNECTIVES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(?:then|and)\s+").expect("connective pattern"));

static CONDITION_LEAD_IN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:if|when|checks?)\b").expect("lead-in pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Schedule phrase table: (pattern, seconds computed from the match).
static SCHEDULE_PATTERNS: Lazy<Vec<(Regex, fn(&Captures<'_>) -> Option<u32>)>> =
    Lazy::new(|| {
        let every_n: fn(&Captures<'_>) -> Option<u32> = |caps| {
            let n: u32 = caps.get(1)?.as_str().parse().ok()?;
            n.checked_mul(unit_seconds(caps.get(2)?.as_str())?)
        };
        let every_unit: fn(&Captures<'_>) -> Option<u32> =
            |caps| unit_seconds(caps.get(1)?.as_str());
        let hourly: fn(&Captures<'_>) -> Option<u32> = |_| Some(3_600);
        let daily: fn(&Captures<'_>) -> Option<u32> = |_| Some(86_400);
        vec![
            (
                Regex::new(r"\bevery\s+(\d+)\s*(minute|min|hour|day)s?\b").expect("schedule pattern"),
                every_n,
            ),
            (
                Regex::new(r"\bevery\s+(minute|hour|day)\b").expect("schedule pattern"),
                every_unit,
            ),
            (Regex::new(r"\bhourly\b").expect("schedule pattern"), hourly),
            (Regex::new(r"\bdaily\b").expect("schedule pattern"), daily),
        ]
    });

fn unit_seconds(unit: &str) -> Option<u32> {
    match unit {
        "minute" | "min" => Some(60),
        "hour" => Some(3_600),
        "day" => Some(86_400),
        _ => None,
    }
}

/// Lowercases and collapses every whitespace run to a single space.
pub fn normalize(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// Interval in seconds for phrases like "every 15 minutes" or "daily".
pub fn extract_schedule(text: &str) -> Option<u32> {
    let text = normalize(text);
    SCHEDULE_PATTERNS
        .iter()
        .find_map(|(regex, seconds)| regex.captures(&text).and_then(|caps| seconds(&caps)))
}

/// 子句提取器
///
/// Trigger patterns are tried in order and the first match wins. Condition
/// patterns are all applied over the whole text. New patterns go at the end
/// of either table via the `push_*` methods.
#[derive(Debug, Clone)]
pub struct Extractor {
    triggers: Vec<ClausePattern>,
    conditions: Vec<ClausePattern>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            triggers: TRIGGER_PATTERNS.clone(),
            conditions: CONDITION_PATTERNS.clone(),
        }
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_trigger_pattern(&mut self, pattern: ClausePattern) {
        self.triggers.push(pattern);
    }

    pub fn push_condition_pattern(&mut self, pattern: ClausePattern) {
        self.conditions.push(pattern);
    }

    pub fn extract(&self, text: &str) -> Extraction {
        let text = normalize(text);
        let trigger = self.find_trigger(&text);
        let actions = self.split_actions(&text, trigger.as_ref().map(|(_, start, end)| (*start, *end)));
        let conditions = self.find_conditions(&text);

        debug!(
            trigger = trigger.as_ref().map(|(t, _, _)| t.as_str()),
            actions = actions.len(),
            conditions = conditions.len(),
            "Extracted clauses"
        );

        Extraction {
            trigger: trigger.map(|(t, _, _)| Clause::new(ClauseKind::Trigger, &t)),
            actions,
            conditions,
        }
    }

    /// First trigger pattern that matches, with the byte span of the whole match.
    fn find_trigger(&self, text: &str) -> Option<(String, usize, usize)> {
        self.triggers.iter().find_map(|p| {
            let found = p.first_match(text);
            if found.is_some() {
                debug!(pattern = p.name, "Trigger pattern matched");
            }
            found
        })
    }

    fn split_actions(&self, text: &str, trigger_span: Option<(usize, usize)>) -> Vec<Clause> {
        let mut segments: Vec<&str> = Vec::new();
        let mut cursor = 0;
        let mut leading_end = text.len();
        for (i, m) in CONNECTIVES.find_iter(text).enumerate() {
            if i == 0 {
                leading_end = m.start();
            }
            segments.push(&text[cursor..m.start()]);
            cursor = m.end();
        }
        segments.push(&text[cursor..]);

        if let Some((start, end)) = trigger_span {
            // The leading segment belongs to the trigger. Whatever follows the
            // trigger phrase inside that segment is still an action.
            segments.remove(0);
            if start < leading_end && end < leading_end {
                segments.insert(0, &text[end..leading_end]);
            }
        }

        segments
            .into_iter()
            .map(clean_segment)
            .filter(|s| !s.is_empty() && !CONDITION_LEAD_IN.is_match(s))
            .map(|s| Clause::new(ClauseKind::Action, s))
            .collect()
    }

    fn find_conditions(&self, text: &str) -> Vec<Clause> {
        self.conditions
            .iter()
            .flat_map(|p| p.all_matches(text))
            .map(|t| Clause::new(ClauseKind::Condition, &t))
            .collect()
    }
}

fn clean_segment(segment: &str) -> &str {
    segment.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ';' | '!'))
}
