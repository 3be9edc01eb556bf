use ghpulse::{ActivityTally, CategoryCounter, Label, Problem, RepoId};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn repo_from_various_urls() {
    let expected = RepoId::new("fastlane", "fastlane").unwrap();
    for url in [
        "https://github.com/fastlane/fastlane/",
        "https://github.com/fastlane/fastlane",
        "http://github.com/fastlane/fastlane/tree/master/docs",
        "github.com/fastlane/fastlane",
        "https://github.com/fastlane/fastlane.git",
        "fastlane/fastlane",
        "/fastlane/fastlane",
    ] {
        assert_eq!(RepoId::from_url(url).unwrap(), expected, "{url}");
    }
}

#[test]
fn repo_url_needs_owner_and_name() {
    assert!(RepoId::from_url("https://github.com/").is_err());
    assert!(RepoId::from_url("https://github.com/fastlane").is_err());
    assert!(RepoId::from_url("").is_err());
}

#[test]
fn repo_paths() {
    let repo = RepoId::new("octo", "widgets").unwrap();
    assert_eq!(repo.collection_path("issues"), "/repos/octo/widgets/issues");
    assert_eq!(repo.to_string(), "octo/widgets");
}

#[test]
fn counter_reads_zero_for_missing_labels() {
    let mut counter = CategoryCounter::new();
    counter.increment(Label::Old);
    counter.increment(Label::Old);

    assert_eq!(counter.get(Label::Old), 2);
    assert_eq!(counter.get(Label::Open), 0);
    assert_eq!(serde_json::to_value(&counter).unwrap(), json!({ "old": 2 }));
}

#[test]
fn tally_counts_and_ranks() {
    let mut tally = ActivityTally::new();
    for login in ["x", "y", "y", "z", "y", "x"] {
        tally.record(login);
    }

    assert_eq!(tally.len(), 3);
    assert_eq!(tally.count("y"), 3);
    assert_eq!(tally.count("nobody"), 0);

    let ranked: Vec<_> = tally.top(30).into_iter().map(|u| (u.login, u.commits)).collect();
    assert_eq!(
        ranked,
        vec![("y".to_string(), 3), ("x".to_string(), 2), ("z".to_string(), 1)]
    );
    assert!(tally.top(0).is_empty());
}

#[test]
fn problems_render_and_serialize() {
    assert_eq!(Problem::Timeout { page: 2 }.to_string(), "request timed out (page 2)");

    let malformed = Problem::malformed("missing created_at", &json!({ "sha": "abc" }));
    assert_eq!(malformed.to_string(), "malformed item abc: missing created_at");
    assert!(!malformed.is_terminal());

    let api = Problem::ApiError {
        page: 1,
        status: 403,
        payload: json!({ "message": "rate limited" }),
    };
    assert!(api.is_terminal());
    assert_eq!(
        serde_json::to_value(&api).unwrap(),
        json!({
            "kind": "api_error",
            "page": 1,
            "status": 403,
            "payload": { "message": "rate limited" },
        })
    );
}
