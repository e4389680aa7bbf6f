//! Rendering of cascading pull request bodies.
//!
//! The body mixes a human-readable explanation with the machine-readable
//! context in an HTML comment, which GitHub hides when displaying the PR:
//!
//! ```text
//! ## Cascading from `release/1.0` to `release/1.1`
//!
//! <!-- {"currentBranch":"release/1.0","targetBranch":"release/1.1",...} -->
//!
//! ...
//!
//! - [ ] !cancel re-cascading! ...
//! - [ ] !cancel bypass! ...
//! ```

use std::fmt::Write;

use crate::types::{CascadingPullRequestInfo, PullRequestContext};

use super::markers::{CANCEL_BYPASS_REVIEWERS_MARK, CANCEL_RETRIGGER_CASCADING_MARK};

/// Produces PR bodies from a cascade context.
///
/// `pr` is the existing pull request when re-rendering one; it is `None`
/// while the PR is being created.
pub trait BodyRenderer {
    fn render(&self, context: &PullRequestContext, pr: Option<&CascadingPullRequestInfo>)
    -> String;
}

/// The default GitHub-flavoured Markdown body.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownBodyRenderer;

/// Serializes the context as the HTML comment embedded in the body.
///
/// `-->` inside a branch name would close the comment early, so `>` is
/// written as a JSON unicode escape there.
pub fn encode_context(context: &PullRequestContext) -> String {
    let json = serde_json::to_string(context).expect("context serialization is infallible");
    format!("<!-- {} -->", json.replace("-->", "--\\u003e"))
}

impl BodyRenderer for MarkdownBodyRenderer {
    fn render(
        &self,
        context: &PullRequestContext,
        pr: Option<&CascadingPullRequestInfo>,
    ) -> String {
        let can_be_merged = pr.and_then(|p| p.mergeable).unwrap_or(true);
        let current = &context.current_branch;
        let target = &context.target_branch;

        let mut body = String::new();
        let _ = writeln!(body, "## Cascading from `{current}` to `{target}`");
        body.push('\n');
        body.push_str(&encode_context(context));
        body.push_str("\n\n");
        let _ = writeln!(
            body,
            "This pull request carries the changes of `{current}` forward into `{target}`."
        );

        if context.is_conflicting {
            body.push('\n');
            body.push_str("> [!WARNING]\n");
            let _ = writeln!(
                body,
                "> `{current}` could not be merged into this pull request automatically. \
                 Once this pull request is merged, the cascade of `{current}` runs again \
                 to pick up the remaining changes."
            );
        }

        if !can_be_merged {
            body.push('\n');
            body.push_str("> [!CAUTION]\n");
            body.push_str("> This pull request has conflicts with its base branch.\n");
            if let Some(pr) = pr.filter(|p| !p.origin_branch_name.is_empty()) {
                let origin = &pr.origin_branch_name;
                let _ = writeln!(
                    body,
                    "> Resolve them locally and push to `{origin}` to update {}:\n>\n\
                     > ```shell\n\
                     > git fetch origin\n\
                     > git checkout {origin}\n\
                     > git merge origin/{target}\n\
                     > git push origin {origin}\n\
                     > ```",
                    pr.id
                );
            }
        }

        if context.bypass_reviewers {
            body.push('\n');
            body.push_str(
                "This pull request is merged automatically, without waiting for reviews, \
                 as soon as all its checks pass.\n",
            );
        }

        body.push_str("\n### Options\n\n");
        let _ = writeln!(
            body,
            "- [ ] {CANCEL_RETRIGGER_CASCADING_MARK} Do not re-run the cascade of `{current}` \
             when this pull request is merged"
        );
        let _ = writeln!(
            body,
            "- [ ] {CANCEL_BYPASS_REVIEWERS_MARK} Wait for reviews instead of merging \
             automatically"
        );

        body
    }
}
