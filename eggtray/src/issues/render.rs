//! Issue and comment text
//!
//! Everything here is a pure function of its inputs. Report bodies carry no
//! timestamps or run links, so re-rendering an unchanged profile yields the
//! same text and reconciliation becomes a no-op.

use crate::models::{Finding, ReadinessState};
use eggtray_common::Identity;
use once_cell::sync::Lazy;
use regex::Regex;

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!--\s*eggtray:identity=([A-Za-z0-9-]+)\s*-->").expect("static regex")
});

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w@])@([A-Za-z0-9-]+)").expect("static regex"));

pub const FIXED_COMMENT: &str = "All problems are fixed! 🎉";

/// Hidden identity marker embedded in report bodies
pub fn identity_marker(identity: &Identity) -> String {
    format!("<!-- eggtray:identity={} -->", identity)
}

/// Identity from a hidden marker
pub fn parse_identity_marker(body: &str) -> Option<Identity> {
    let captures = MARKER_RE.captures(body)?;
    Identity::parse(&captures[1]).ok()
}

/// First `@handle` mentioned in free text
pub fn mentioned_handle(text: &str) -> Option<Identity> {
    MENTION_RE
        .captures_iter(text)
        .find_map(|c| Identity::parse(&c[1]).ok())
}

pub fn report_title(identity: &Identity) -> String {
    format!("Profile @{} is not ready", identity)
}

pub fn report_body(identity: &Identity, findings: &[Finding]) -> String {
    let mut text = format!(
        "A scheduled check of the profile of @{} found the problems below 🚨 \
         Until they are fixed, **the profile is not ready for job hunting** \
         and is listed with lower priority.\n\n\
         The profile is checked again every day; this issue closes itself \
         once everything is fine.\n\n",
        identity
    );
    text.push_str(&findings_table(findings));
    text.push('\n');
    text.push_str(&identity_marker(identity));
    text
}

pub fn duplicate_comment(kept: u64) -> String {
    format!("Duplicate of #{}", kept)
}

/// Markdown table of findings, errors first
pub fn findings_table(findings: &[Finding]) -> String {
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    // Stable: rule order is kept within one severity
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut table = String::from("| Verdict | Finding | Rule |\n|---------|---------|------|\n");
    for finding in sorted {
        table.push_str(&format!(
            "| {} | {} | `{}` |\n",
            finding.severity.marker(),
            escape_cell(&finding.message),
            finding.rule
        ));
    }
    table
}

pub fn check_title(identity: &Identity) -> String {
    format!("Feedback on profile @{}", identity)
}

pub fn wait_comment(identity: &Identity, run_url: Option<&str>) -> String {
    let mut text = format!(
        "Hi!\n\n🔬 Looks like you want feedback on the GitHub profile \
         [github.com/{id}](https://github.com/{id}). On it! \
         Results will show up here and then this issue gets closed.\n\n\
         ⏳ Large profiles can take a few minutes",
        id = identity
    );
    match run_url {
        Some(url) => text.push_str(&format!(", you can [follow the progress]({}).", url)),
        None => text.push('.'),
    }
    text
}

pub fn missing_account_comment(identity: &Identity, run_url: Option<&str>) -> String {
    let mut text = format!(
        "Hi! You asked for a look at [github.com/{id}](https://github.com/{id}), \
         but that profile does not seem to exist 🤷",
        id = identity
    );
    append_run_link(&mut text, run_url);
    text
}

pub fn summary_comment(
    identity: &Identity,
    state: ReadinessState,
    findings: &[Finding],
    run_url: Option<&str>,
) -> String {
    let mut text = format!(
        "I went through the whole profile \
         [github.com/{id}](https://github.com/{id}) and here is my feedback 🔬\n\n",
        id = identity
    );
    if state.is_ready() {
        text.push_str("No major problems found, you are good to start job hunting! 💪\n\n");
    } else {
        text.push_str(
            "There are major problems 🔴 Fix them before you start job hunting, \
             then feel free to ask for another check.\n\n",
        );
    }
    if findings.is_empty() {
        text.push_str("Nothing to report.\n");
    } else {
        text.push_str(&findings_table(findings));
    }
    append_run_link(&mut text, run_url);
    text
}

fn append_run_link(text: &mut String, run_url: Option<&str>) {
    if let Some(url) = run_url {
        text.push_str(&format!("\n\n---\n\n[Run log]({})", url));
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
