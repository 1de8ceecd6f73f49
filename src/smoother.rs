//! Optional phrasing pass over the deterministic fact paragraph.
//!
//! A smoother may only contribute an opening sentence. Its output is split
//! into sentences and filtered; an opener whose figures differ from the
//! headline is dropped, and every deterministic line (headline included) is
//! re-appended in its fixed order. Any failure falls back to the
//! deterministic narrative.
use crate::aggregator::Summary;
use crate::classifier;
use crate::config::{InsightSettings, SmootherConfig};
use crate::error::{ReportError, Result};
use crate::insights::{build_narrative, LineKind, Narrative};
use crate::types::MonthLabel;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Rewrites a fact paragraph. Implementations are owned by the caller and
/// passed in explicitly; running without one is the normal case.
pub trait PhraseSmoother {
    fn smooth(&self, facts: &str) -> Result<String>;
}

/// Pipes the fact paragraph to a local command and reads the rewrite from
/// its stdout.
#[derive(Debug, Clone)]
pub struct CommandSmoother {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSmoother {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// `None` when no command is configured.
    pub fn from_config(cfg: &SmootherConfig) -> Option<Self> {
        let program = cfg.command.as_deref()?.trim();
        if program.is_empty() {
            return None;
        }
        Some(Self::new(
            program,
            cfg.args.clone(),
            Duration::from_secs(cfg.timeout_secs),
        ))
    }
}

impl PhraseSmoother for CommandSmoother {
    fn smooth(&self, facts: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReportError::Smoother("stdio not captured".into()));
        };

        // Write and read on one thread so both sit inside the timeout.
        let input = facts.to_string();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let res = stdin.write_all(input.as_bytes()).and_then(|_| {
                drop(stdin);
                let mut buf = String::new();
                stdout.read_to_string(&mut buf).map(|_| buf)
            });
            let _ = tx.send(res);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(out)) => {
                let status = child.wait()?;
                if status.success() {
                    Ok(out)
                } else {
                    Err(ReportError::Smoother(format!(
                        "{} exited with {}",
                        self.program, status
                    )))
                }
            }
            Ok(Err(e)) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(e.into())
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(ReportError::Smoother(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                )))
            }
        }
    }
}

static BLOCKED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:year|quarter|week|today|yesterday|tomorrow|usa|united states|company-wide)\b|\bU\.S\.",
    )
    .expect("blocked-words pattern is valid")
});

static NAMED_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z]+(?:\s[A-Za-z][A-Za-z]+)*)\s*\(\d+\)")
        .expect("named-count pattern is valid")
});

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern is valid"));

const INSIGHT_PHRASES: &[&str] = &[
    "top issue",
    "top engineer",
    "most improved",
    "new emerging issue",
    "issue variety",
    "workload concentrated",
    "workload evenly distributed",
    "month-over-month",
    "vs previous month",
    "close rate",
];

/// Deterministic narrative text, optionally led by a smoothed opener.
pub fn narrate_with(
    summary: &Summary,
    month: MonthLabel,
    settings: &InsightSettings,
    smoother: Option<&dyn PhraseSmoother>,
) -> String {
    let narrative = build_narrative(summary, month, settings);
    let Some(smoother) = smoother else {
        return narrative.text();
    };
    if narrative.line(LineKind::Headline).is_none() {
        return narrative.text();
    }

    let facts = narrative.facts();
    let rewritten = match smoother.smooth(&facts) {
        Ok(text) => text,
        Err(e) => {
            warn!(month = %month, error = %e, "phrasing smoother failed; using deterministic text");
            return narrative.text();
        }
    };

    let mut known: Vec<&str> = summary.month(month).engineer_names();
    known.extend(classifier::labels().map(|l| l as &str));
    let kept = sanitize(&rewritten, month, &known, &facts);
    debug!(month = %month, kept = kept.len(), "sanitized smoother output");

    let text = assemble(&narrative, &kept);
    if text.split_whitespace().count() < 12 {
        return narrative.text();
    }
    text
}

/// Smoothed opener (if one survived) in front of the full deterministic
/// text. The opener must carry the headline's figures in the headline's
/// order (month, total, closed, open), so a rewrite that swaps them is
/// dropped.
fn assemble(narrative: &Narrative, kept: &[String]) -> String {
    let text = narrative.text();
    let Some(headline) = narrative.line(LineKind::Headline) else {
        return text;
    };
    let month = narrative.month.to_string().to_lowercase();
    let expected = numbers(headline);
    let opener = kept.iter().find(|s| {
        let lower = s.to_lowercase();
        lower.contains(&month)
            && ["issues", "closed", "open"].iter().any(|w| lower.contains(w))
    });
    match opener {
        Some(o) if o.as_str() != headline && numbers(o) == expected => format!("{}\n{}", o, text),
        _ => text,
    }
}

fn numbers(s: &str) -> Vec<&str> {
    NUMBER.find_iter(s).map(|m| m.as_str()).collect()
}

/// Sentences from `text` that stay in scope: no out-of-month time words, no
/// unknown `Name (n)` mentions, only numbers that occur in `facts`, and
/// either a headline mention of `month` or a known insight phrase.
pub fn sanitize(text: &str, month: MonthLabel, known_names: &[&str], facts: &str) -> Vec<String> {
    let month = month.to_string().to_lowercase();
    let fact_numbers: HashSet<&str> = NUMBER.find_iter(facts).map(|m| m.as_str()).collect();

    split_sentences(text)
        .into_iter()
        .filter(|s| !BLOCKED.is_match(s))
        .filter(|s| {
            NAMED_COUNT.captures_iter(s).all(|caps| {
                let named = caps[1].trim();
                known_names
                    .iter()
                    .any(|k| named == *k || named.ends_with(&format!(" {}", k)))
            })
        })
        .filter(|s| NUMBER.find_iter(s).all(|m| fact_numbers.contains(m.as_str())))
        .filter(|s| {
            let lower = s.to_lowercase();
            let headline = lower.contains(&month)
                && ["issues", "closed", "open"].iter().any(|w| lower.contains(w));
            headline || INSIGHT_PHRASES.iter().any(|p| lower.contains(p))
        })
        .map(|s| finalize(&s))
        .collect()
}

/// Split on `.`, `!` or `?` followed by whitespace, so decimals such as
/// `70.0%` stay inside their sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            let s = current.trim();
            if !s.is_empty() {
                out.push(s.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}

fn finalize(s: &str) -> String {
    let mut t = s.trim().to_string();
    if !t.ends_with(['.', '!', '?']) {
        t.push('.');
    }
    t
}
