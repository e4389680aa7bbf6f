//! GitHub effect interpreter using octocrab.
//!
//! Typed octocrab builders are used where they exist; the remaining endpoints
//! (contents, branches, compare, merges, labels) go through raw REST routes.
//! Branch names are percent-encoded whenever they appear in a path.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::effects::{
    ComparisonData, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData, RepoSettingsData,
};
use crate::types::{PrNumber, PrState};

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use super::retry::{RetryConfig, RetryPolicy, retry_with_backoff};

/// Branch listing stops after this many pages of 100.
const MAX_BRANCH_PAGES: u32 = 20;

const PER_PAGE: u8 = 100;

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        let policy = RetryPolicy::for_effect(&effect);
        interpret_github_effect(self, effect, RetryConfig::DEFAULT, policy).await
    }
}

/// Executes `effect` against the GitHub API, retrying transient failures
/// according to `retry_config`.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
    retry_config: RetryConfig,
    retry_policy: RetryPolicy,
) -> Result<GitHubResponse, GitHubApiError> {
    tracing::debug!(repo = %client.repo(), effect = effect.name(), "Executing GitHub effect");
    retry_with_backoff(retry_config, retry_policy, effect.name(), || {
        execute_effect(client, effect.clone())
    })
    .await
}

async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetRepoSettings => get_repo_settings(client).await,
        GitHubEffect::GetFileContent { path, reference } => {
            get_file_content(client, &path, reference.as_deref()).await
        }
        GitHubEffect::ListBranches => list_branches(client).await,
        GitHubEffect::CreateBranch { name, base } => create_branch(client, &name, &base).await,
        GitHubEffect::DeleteBranch { name } => delete_branch(client, &name).await,
        GitHubEffect::CompareBranches { base, head } => {
            compare_branches(client, &base, &head).await
        }
        GitHubEffect::MergeBranch { head, base } => merge_branch(client, &head, &base).await,
        GitHubEffect::ListOpenPrs { head, base } => list_open_prs(client, head, base).await,
        GitHubEffect::GetPr { pr } => get_pr(client, pr).await,
        GitHubEffect::CreatePr {
            head,
            base,
            title,
            body,
        } => create_pr(client, head, base, title, body).await,
        GitHubEffect::UpdatePr { pr, body, title } => update_pr(client, pr, body, title).await,
        GitHubEffect::AddLabels { pr, labels } => add_labels(client, pr, labels).await,
        GitHubEffect::MergePr { pr } => merge_pr(client, pr).await,
    }
}

// ─── Repository ───────────────────────────────────────────────────────────────

async fn get_repo_settings(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let repo = client
        .api()
        .repos(client.owner(), client.repo_name())
        .get()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::RepoSettings(RepoSettingsData {
        default_branch: repo.default_branch.unwrap_or_default(),
    }))
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
}

async fn get_file_content(
    client: &OctocrabClient,
    path: &str,
    reference: Option<&str>,
) -> Result<GitHubResponse, GitHubApiError> {
    let mut route = client.route(&format!("/contents/{}", path.trim_start_matches('/')));
    if let Some(reference) = reference {
        route.push_str("?ref=");
        route.push_str(&urlencoding::encode(reference));
    }

    let result: Result<ContentResponse, _> = client.api().get(&route, None::<&()>).await;
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            let err = GitHubApiError::from_octocrab(e);
            if err.is_not_found() {
                return Ok(GitHubResponse::FileContent(None));
            }
            return Err(err);
        }
    };

    let Some(content) = response.content else {
        // Directories and submodules have no inline content.
        return Ok(GitHubResponse::FileContent(None));
    };
    if response.encoding.as_deref().is_some_and(|e| e != "base64") {
        return Err(GitHubApiError::permanent(format!(
            "unsupported content encoding for {path}"
        )));
    }

    Ok(GitHubResponse::FileContent(Some(decode_base64_content(
        &content,
    )?)))
}

/// Decodes the base64 payload of the contents API, which wraps lines at 60
/// characters.
fn decode_base64_content(content: &str) -> Result<String, GitHubApiError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| GitHubApiError::permanent(format!("invalid base64: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| GitHubApiError::permanent(format!("file is not UTF-8: {e}")))
}

// ─── Branches ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
}

async fn list_branches(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let mut names = Vec::new();

    for page in 1..=MAX_BRANCH_PAGES {
        let route = client.route(&format!("/branches?per_page={PER_PAGE}&page={page}"));
        let items: Vec<BranchResponse> = client
            .api()
            .get(&route, None::<&()>)
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let is_last_page = items.len() < usize::from(PER_PAGE);
        names.extend(items.into_iter().map(|b| b.name));

        if is_last_page {
            return Ok(GitHubResponse::Branches(names));
        }
    }

    tracing::warn!(
        repo = %client.repo(),
        pages = MAX_BRANCH_PAGES,
        branches = names.len(),
        "Hit pagination limit while listing branches; list may be incomplete"
    );
    Ok(GitHubResponse::Branches(names))
}

async fn branch_head_sha(client: &OctocrabClient, branch: &str) -> Result<String, GitHubApiError> {
    let route = client.route(&format!("/branches/{}", urlencoding::encode(branch)));
    let response: BranchResponse = client
        .api()
        .get(&route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(response.commit.sha)
}

async fn create_branch(
    client: &OctocrabClient,
    name: &str,
    base: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct CreateRefRequest<'a> {
        #[serde(rename = "ref")]
        reference: String,
        sha: &'a str,
    }

    let sha = branch_head_sha(client, base).await?;
    let request = CreateRefRequest {
        reference: format!("refs/heads/{name}"),
        sha: &sha,
    };

    let _: serde_json::Value = client
        .api()
        .post(client.route("/git/refs"), Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::BranchCreated)
}

async fn delete_branch(
    client: &OctocrabClient,
    name: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    // The refs API wants the slashes of `heads/release/1.0` kept literal.
    let segments: Vec<_> = name.split('/').map(urlencoding::encode).collect();
    let route = client.route(&format!("/git/refs/heads/{}", segments.join("/")));
    let response = client
        .api()
        ._delete(route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    octocrab::map_github_error(response)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::BranchDeleted)
}

async fn compare_branches(
    client: &OctocrabClient,
    base: &str,
    head: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Debug, Deserialize)]
    struct CompareResponse {
        ahead_by: u64,
        behind_by: u64,
    }

    // Branch names may contain `...`, so compare commits rather than names.
    let base_sha = branch_head_sha(client, base).await?;
    let head_sha = branch_head_sha(client, head).await?;
    let route = client.route(&format!("/compare/{base_sha}...{head_sha}"));

    let response: CompareResponse = client
        .api()
        .get(&route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Comparison(ComparisonData {
        ahead_by: response.ahead_by,
        behind_by: response.behind_by,
    }))
}

async fn merge_branch(
    client: &OctocrabClient,
    head: &str,
    base: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct MergeRequest<'a> {
        base: &'a str,
        head: &'a str,
    }

    // 201 with the merge commit, or 204 with an empty body when `base`
    // already contains `head`. Only the status matters here.
    let response = client
        .api()
        ._post(client.route("/merges"), Some(&MergeRequest { base, head }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    octocrab::map_github_error(response)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::BranchMerged)
}

// ─── Pull Requests ────────────────────────────────────────────────────────────

fn pr_data_from_pull(pull: octocrab::models::pulls::PullRequest) -> PrData {
    let state = if pull.merged_at.is_some() {
        PrState::Merged
    } else if pull.state == Some(octocrab::models::IssueState::Closed) {
        PrState::Closed
    } else {
        PrState::Open
    };

    PrData {
        number: PrNumber(pull.number),
        head_ref: pull.head.ref_field,
        base_ref: pull.base.ref_field,
        body: pull.body,
        state,
        mergeable: pull.mergeable,
        author_id: pull.user.map(|u| u.id.into_inner()),
        created_at: pull.created_at,
    }
}

async fn list_open_prs(
    client: &OctocrabClient,
    head: Option<String>,
    base: Option<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    let mut page = 1u32;
    let mut prs = Vec::new();

    loop {
        let pulls = client.api().pulls(client.owner(), client.repo_name());
        let mut request = pulls
            .list()
            .state(octocrab::params::State::Open)
            .sort(octocrab::params::pulls::Sort::Created)
            .direction(octocrab::params::Direction::Ascending)
            .per_page(PER_PAGE)
            .page(page);
        if let Some(head) = &head {
            // The API only filters on `owner:branch`.
            request = request.head(format!("{}:{}", client.owner(), head));
        }
        if let Some(base) = &base {
            request = request.base(base.clone());
        }

        let items = request
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?
            .items;

        let is_last_page = items.len() < usize::from(PER_PAGE);
        prs.extend(items.into_iter().map(pr_data_from_pull));

        if is_last_page {
            break;
        }
        page += 1;
    }

    Ok(GitHubResponse::PrList(prs))
}

async fn get_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let pull = client
        .api()
        .pulls(client.owner(), client.repo_name())
        .get(pr.0)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Pr(pr_data_from_pull(pull)))
}

async fn create_pr(
    client: &OctocrabClient,
    head: String,
    base: String,
    title: String,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let pull = client
        .api()
        .pulls(client.owner(), client.repo_name())
        .create(title, head, base)
        .body(body)
        .send()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Pr(pr_data_from_pull(pull)))
}

async fn update_pr(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
    title: Option<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    let pulls = client.api().pulls(client.owner(), client.repo_name());
    let mut request = pulls.update(pr.0).body(body);
    if let Some(title) = title {
        request = request.title(title);
    }

    let pull = request
        .send()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Pr(pr_data_from_pull(pull)))
}

async fn add_labels(
    client: &OctocrabClient,
    pr: PrNumber,
    labels: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct LabelsRequest {
        labels: Vec<String>,
    }

    let route = client.route(&format!("/issues/{}/labels", pr.0));
    let _: serde_json::Value = client
        .api()
        .post(route, Some(&LabelsRequest { labels }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::LabelsAdded)
}

async fn merge_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Debug, Deserialize)]
    struct MergeResponse {
        merged: bool,
    }

    let route = client.route(&format!("/pulls/{}/merge", pr.0));
    let response: MergeResponse = client
        .api()
        .put(route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::PrMerged {
        merged: response.merged,
    })
}
