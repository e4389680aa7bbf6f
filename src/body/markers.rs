//! Checkbox markers that let humans opt a pull request out of automation.
//!
//! The body renders one Markdown task-list line per marker. A marker is
//! active when the first list line containing it is checked (`- [x]`, any
//! case). Editing the text around the marker does not matter.

use std::sync::LazyLock;

use regex::Regex;

/// Checking this line stops a merged conflict PR from re-running the cascade.
pub const CANCEL_RETRIGGER_CASCADING_MARK: &str = "!cancel re-cascading!";

/// Checking this line stops the bot from merging the PR without reviews.
pub const CANCEL_BYPASS_REVIEWERS_MARK: &str = "!cancel bypass!";

static CHECKED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^ *- \[x\]").expect("static regex is valid"));

static RETRIGGER_LINE: LazyLock<Regex> =
    LazyLock::new(|| marker_line(CANCEL_RETRIGGER_CASCADING_MARK));

static BYPASS_LINE: LazyLock<Regex> = LazyLock::new(|| marker_line(CANCEL_BYPASS_REVIEWERS_MARK));

fn marker_line(mark: &str) -> Regex {
    Regex::new(&format!(r"(?m)^ *- .*{}.*$", regex::escape(mark)))
        .expect("escaped marker yields a valid regex")
}

fn is_checked(line: &Regex, body: &str) -> bool {
    line.find(body)
        .is_some_and(|m| CHECKED_ITEM.is_match(m.as_str()))
}

/// True when the "cancel re-cascading" box is ticked.
pub fn is_retrigger_cancelled(body: &str) -> bool {
    is_checked(&RETRIGGER_LINE, body)
}

/// True when the "cancel bypass" box is ticked.
pub fn is_bypass_cancelled(body: &str) -> bool {
    is_checked(&BYPASS_LINE, body)
}
