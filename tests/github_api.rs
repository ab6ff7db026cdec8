use dependabot_rebase::{Forge, GitHub, REBASE_COMMAND, Repo};
use mockito::{Matcher, Server, ServerGuard};
use octocrab::Octocrab;
use serde_json::{Value, json};

fn test_repo() -> Repo {
    Repo::new("owner", "repo").unwrap()
}

fn github_for(server: &ServerGuard) -> GitHub {
    let client = Octocrab::builder()
        .base_uri(server.url())
        .unwrap()
        .build()
        .unwrap();
    GitHub::new(client)
}

fn author_json(login: &str, id: u64) -> Value {
    let api = format!("https://api.github.com/users/{login}");
    json!({
        "login": login,
        "id": id,
        "node_id": format!("MDQ6VXNlcj{id}"),
        "avatar_url": format!("https://avatars.githubusercontent.com/u/{id}"),
        "gravatar_id": "",
        "url": api,
        "html_url": format!("https://github.com/{login}"),
        "followers_url": format!("{api}/followers"),
        "following_url": format!("{api}/following{{/other_user}}"),
        "gists_url": format!("{api}/gists{{/gist_id}}"),
        "starred_url": format!("{api}/starred{{/owner}}{{/repo}}"),
        "subscriptions_url": format!("{api}/subscriptions"),
        "organizations_url": format!("{api}/orgs"),
        "repos_url": format!("{api}/repos"),
        "events_url": format!("{api}/events{{/privacy}}"),
        "received_events_url": format!("{api}/received_events"),
        "type": "Bot",
        "site_admin": false
    })
}

fn pull_request_json(number: u64, locked: bool, rebaseable: Value) -> Value {
    let api = format!("https://api.github.com/repos/owner/repo/pulls/{number}");
    json!({
        "url": api,
        "id": 1000 + number,
        "node_id": format!("PR_{number}"),
        "html_url": format!("https://github.com/owner/repo/pull/{number}"),
        "diff_url": format!("https://github.com/owner/repo/pull/{number}.diff"),
        "patch_url": format!("https://github.com/owner/repo/pull/{number}.patch"),
        "issue_url": format!("https://api.github.com/repos/owner/repo/issues/{number}"),
        "commits_url": format!("{api}/commits"),
        "review_comments_url": format!("{api}/comments"),
        "comments_url": format!("https://api.github.com/repos/owner/repo/issues/{number}/comments"),
        "statuses_url": format!("https://api.github.com/repos/owner/repo/statuses/sha{number}"),
        "number": number,
        "state": "open",
        "locked": locked,
        "title": format!("Bump crate-{number} from 1.0.0 to 1.0.1"),
        "user": author_json("dependabot[bot]", 49699333),
        "body": "Bumps crate.",
        "labels": [],
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-02T00:00:00Z",
        "author_association": "CONTRIBUTOR",
        "draft": false,
        "rebaseable": rebaseable,
        "head": {
            "label": format!("owner:dependabot/cargo/crate-{number}"),
            "ref": format!("dependabot/cargo/crate-{number}"),
            "sha": format!("sha{number}"),
            "user": author_json("owner", 1),
            "repo": null
        },
        "base": {
            "label": "owner:main",
            "ref": "main",
            "sha": "basesha",
            "user": author_json("owner", 1),
            "repo": null
        }
    })
}

fn comment_json(id: u64, login: &str, body: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "node_id": format!("IC_{id}"),
        "url": format!("https://api.github.com/repos/owner/repo/issues/comments/{id}"),
        "html_url": format!("https://github.com/owner/repo/pull/1#issuecomment-{id}"),
        "issue_url": "https://api.github.com/repos/owner/repo/issues/1",
        "body": body,
        "author_association": "NONE",
        "user": author_json(login, id),
        "created_at": created_at,
        "updated_at": created_at
    })
}

#[tokio::test]
async fn test_list_open_pull_requests_maps_fields() {
    let mut server = Server::new_async().await;
    let mut locked = pull_request_json(2, true, Value::Null);
    locked["user"] = Value::Null;
    let list = server
        .mock("GET", "/repos/owner/repo/pulls")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("state".into(), "open".into()),
            Matcher::UrlEncoded("per_page".into(), "100".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([pull_request_json(1, false, json!(true)), locked]).to_string())
        .create_async()
        .await;

    let prs = github_for(&server)
        .list_open_pull_requests(&test_repo())
        .await
        .unwrap();

    list.assert_async().await;
    assert_eq!(prs.len(), 2);
    assert_eq!(prs[0].number, 1);
    assert_eq!(prs[0].author_login.as_deref(), Some("dependabot[bot]"));
    assert_eq!(prs[0].url, "https://github.com/owner/repo/pull/1");
    assert_eq!(prs[0].base_ref, "main");
    assert_eq!(prs[0].head_sha, "sha1");
    assert!(!prs[0].locked);
    assert_eq!(prs[0].rebaseable, Some(true));
    assert!(prs[1].locked);
    assert_eq!(prs[1].author_login, None);
    assert_eq!(prs[1].rebaseable, None);
}

#[tokio::test]
async fn test_get_pull_request_reads_rebaseable() {
    let mut server = Server::new_async().await;
    let get = server
        .mock("GET", "/repos/owner/repo/pulls/7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(pull_request_json(7, false, json!(false)).to_string())
        .create_async()
        .await;

    let pr = github_for(&server)
        .get_pull_request(&test_repo(), 7)
        .await
        .unwrap();

    get.assert_async().await;
    assert_eq!(pr.number, 7);
    assert_eq!(pr.rebaseable, Some(false));
    assert!(!pr.is_rebaseable());
}

#[tokio::test]
async fn test_compare_commits_escapes_refs() {
    let mut server = Server::new_async().await;
    let compare = server
        .mock("GET", "/repos/owner/repo/compare/release%231...abc")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "1".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"status": "diverged", "ahead_by": 1, "behind_by": 3}).to_string())
        .create_async()
        .await;

    let comparison = github_for(&server)
        .compare_commits(&test_repo(), "release#1", "abc")
        .await
        .unwrap();

    compare.assert_async().await;
    assert_eq!(comparison.base, "release#1");
    assert_eq!(comparison.head, "abc");
    assert_eq!(comparison.ahead_by, 1);
    assert_eq!(comparison.behind_by, 3);
}

#[tokio::test]
async fn test_list_issue_events_drains_pages_and_allows_missing_actor() {
    let mut server = Server::new_async().await;
    let next = format!(
        "<{}/repos/owner/repo/issues/1/events?per_page=100&page=2>; rel=\"next\"",
        server.url()
    );
    let first = server
        .mock("GET", "/repos/owner/repo/issues/1/events")
        .match_query(Matcher::Exact("per_page=100".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("link", next.as_str())
        .with_body(
            json!([{
                "id": 1,
                "actor": {"login": "dependabot[bot]"},
                "event": "head_ref_force_pushed",
                "created_at": "2024-01-03T00:00:00Z"
            }])
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/repos/owner/repo/issues/1/events")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "id": 2,
                "actor": null,
                "event": "labeled",
                "created_at": "2024-01-01T00:00:00Z"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let events = github_for(&server)
        .list_issue_events(&test_repo(), 1)
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].actor.as_deref(), Some("dependabot[bot]"));
    assert_eq!(events[0].event, "head_ref_force_pushed");
    assert_eq!(events[1].actor, None);
    assert_eq!(events[1].event, "labeled");
}

#[tokio::test]
async fn test_list_issue_comments_maps_author_and_body() {
    let mut server = Server::new_async().await;
    let comments = server
        .mock("GET", "/repos/owner/repo/issues/1/comments")
        .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([comment_json(
                11,
                "dependabot[bot]",
                "@dependabot recreate",
                "2024-01-04T00:00:00Z"
            )])
            .to_string(),
        )
        .create_async()
        .await;

    let listed = github_for(&server)
        .list_issue_comments(&test_repo(), 1)
        .await
        .unwrap();

    comments.assert_async().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].author.as_deref(), Some("dependabot[bot]"));
    assert_eq!(listed[0].body, "@dependabot recreate");
    assert_eq!(listed[0].created_at.to_rfc3339(), "2024-01-04T00:00:00+00:00");
}

#[tokio::test]
async fn test_create_issue_comment_posts_body() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/repos/owner/repo/issues/1/comments")
        .match_body(Matcher::Json(json!({"body": REBASE_COMMAND})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            comment_json(12, "github-actions[bot]", REBASE_COMMAND, "2024-01-05T00:00:00Z")
                .to_string(),
        )
        .create_async()
        .await;

    github_for(&server)
        .create_issue_comment(&test_repo(), 1, REBASE_COMMAND)
        .await
        .unwrap();

    create.assert_async().await;
}
