#![allow(dead_code)]

//! Behavior every `UrlRepository` backend must share.

use url_shortener_store::domain::entities::{BatchRequest, StorageStats, UrlPair};
use url_shortener_store::domain::repositories::UrlRepository;
use url_shortener_store::error::StoreError;

pub const BASE: &str = "http://host/";

pub fn code_of(short_url: &str) -> &str {
    short_url
        .strip_prefix(BASE)
        .expect("short URL must start with the base")
}

pub async fn round_trip(repo: &dyn UrlRepository) {
    let short_url = repo
        .create_short_url("u1", BASE, "https://example.com/round-trip")
        .await
        .unwrap();

    let code = code_of(&short_url);
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(
        repo.get_long_url(code).await.unwrap(),
        "https://example.com/round-trip"
    );
}

pub async fn duplicate_returns_existing_short_url(repo: &dyn UrlRepository) {
    let short_url = repo
        .create_short_url("u1", BASE, "https://example.com/dup")
        .await
        .unwrap();

    for owner in ["u1", "u2"] {
        let err = repo
            .create_short_url(owner, BASE, "https://example.com/dup")
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(err.existing_short_url(), Some(short_url.as_str()));
    }

    // The duplicate request does not hand the URL to the second owner.
    assert!(repo.get_user_urls("u2").await.unwrap().is_empty());
    assert_eq!(repo.get_stats().await.unwrap().urls, 1);
}

pub async fn soft_delete_is_terminal(repo: &dyn UrlRepository) {
    let short_url = repo
        .create_short_url("u1", BASE, "https://example.com/delete-me")
        .await
        .unwrap();
    let code = code_of(&short_url).to_string();

    repo.delete_urls("u1", &[code.clone()]).await.unwrap();

    assert!(matches!(repo.get_long_url(&code).await, Err(StoreError::Gone)));

    // Deleting again is allowed and changes nothing.
    repo.delete_urls("u1", &[code.clone()]).await.unwrap();
    assert!(matches!(repo.get_long_url(&code).await, Err(StoreError::Gone)));

    // The URL stays claimed by its deleted record.
    let err = repo
        .create_short_url("u1", BASE, "https://example.com/delete-me")
        .await
        .unwrap_err();
    assert_eq!(err.existing_short_url(), Some(short_url.as_str()));
}

pub async fn unknown_code_is_not_found(repo: &dyn UrlRepository) {
    assert!(matches!(
        repo.get_long_url("zzzzzz").await,
        Err(StoreError::NotFound)
    ));
}

pub async fn delete_enforces_ownership(repo: &dyn UrlRepository) {
    let short_url = repo
        .create_short_url("alice", BASE, "https://example.com/alice")
        .await
        .unwrap();
    let code = code_of(&short_url).to_string();

    let result = repo.delete_urls("bob", &[code.clone()]).await;

    assert!(matches!(result, Err(StoreError::UserMismatch)));
    assert_eq!(
        repo.get_long_url(&code).await.unwrap(),
        "https://example.com/alice"
    );
}

pub async fn mixed_delete_applies_nothing(repo: &dyn UrlRepository) {
    let mine = repo
        .create_short_url("u1", BASE, "https://example.com/mine")
        .await
        .unwrap();
    let theirs = repo
        .create_short_url("u2", BASE, "https://example.com/theirs")
        .await
        .unwrap();
    let mine = code_of(&mine).to_string();
    let theirs = code_of(&theirs).to_string();

    let result = repo
        .delete_urls("u1", &[mine.clone(), theirs.clone()])
        .await;
    assert!(matches!(result, Err(StoreError::UserMismatch)));

    let result = repo
        .delete_urls("u1", &[mine.clone(), "zzzzzz".to_string()])
        .await;
    assert!(matches!(result, Err(StoreError::UserMismatch)));

    assert!(repo.get_long_url(&mine).await.is_ok());
    assert!(repo.get_long_url(&theirs).await.is_ok());
}

pub async fn empty_delete_is_noop(repo: &dyn UrlRepository) {
    repo.delete_urls("u1", &[]).await.unwrap();
}

pub async fn batch_creates_in_order(repo: &dyn UrlRepository) {
    let items = vec![
        BatchRequest::new("c1", "https://a.example.com"),
        BatchRequest::new("c2", "https://b.example.com"),
        BatchRequest::new("c3", "https://c.example.com"),
    ];

    let responses = repo
        .batch_create_short_url("u1", BASE, items)
        .await
        .unwrap();

    let ids: Vec<&str> = responses.iter().map(|r| r.correlation_id.as_str()).collect();
    assert_eq!(ids, ["c1", "c2", "c3"]);
    assert_eq!(
        repo.get_long_url(code_of(&responses[1].short_url))
            .await
            .unwrap(),
        "https://b.example.com"
    );

    let mut codes: Vec<&str> = responses.iter().map(|r| code_of(&r.short_url)).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), 3);
}

pub async fn batch_is_atomic(repo: &dyn UrlRepository) {
    let existing = repo
        .create_short_url("u1", BASE, "https://b.example.com")
        .await
        .unwrap();

    let items = vec![
        BatchRequest::new("1", "https://a.example.com"),
        BatchRequest::new("2", "https://b.example.com"),
        BatchRequest::new("3", "https://c.example.com"),
    ];

    let err = repo
        .batch_create_short_url("u1", BASE, items)
        .await
        .unwrap_err();

    assert!(err.is_duplicate());
    assert_eq!(err.existing_short_url(), Some(existing.as_str()));

    let listed = repo.get_user_urls("u1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].original_url, "https://b.example.com");
    assert_eq!(repo.get_stats().await.unwrap().urls, 1);
}

pub async fn batch_rejects_repeated_url(repo: &dyn UrlRepository) {
    let items = vec![
        BatchRequest::new("1", "https://same.example.com"),
        BatchRequest::new("2", "https://other.example.com"),
        BatchRequest::new("3", "https://same.example.com"),
    ];

    let err = repo
        .batch_create_short_url("u1", BASE, items)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Duplicate { short_url: None }));
    assert_eq!(repo.get_stats().await.unwrap(), StorageStats::default());
}

pub async fn empty_batch_returns_empty(repo: &dyn UrlRepository) {
    let responses = repo
        .batch_create_short_url("u1", BASE, Vec::new())
        .await
        .unwrap();

    assert!(responses.is_empty());
}

pub async fn large_batch_spans_chunks(repo: &dyn UrlRepository) {
    let items: Vec<BatchRequest> = (0..250)
        .map(|i| BatchRequest::new(i.to_string(), format!("https://example.com/page/{i}")))
        .collect();

    let responses = repo
        .batch_create_short_url("u1", BASE, items)
        .await
        .unwrap();

    assert_eq!(responses.len(), 250);
    assert_eq!(responses[249].correlation_id, "249");
    assert_eq!(
        repo.get_long_url(code_of(&responses[249].short_url))
            .await
            .unwrap(),
        "https://example.com/page/249"
    );
    assert_eq!(repo.get_stats().await.unwrap().urls, 250);
}

pub async fn listing_excludes_deleted(repo: &dyn UrlRepository) {
    let mut kept = Vec::new();
    for url in ["https://one.example.com", "https://two.example.com"] {
        let short_url = repo.create_short_url("u1", BASE, url).await.unwrap();
        kept.push(UrlPair {
            short_code: code_of(&short_url).to_string(),
            original_url: url.to_string(),
        });
    }
    let dropped = repo
        .create_short_url("u1", BASE, "https://three.example.com")
        .await
        .unwrap();
    repo.delete_urls("u1", &[code_of(&dropped).to_string()])
        .await
        .unwrap();

    kept.sort_by(|a, b| a.short_code.cmp(&b.short_code));
    assert_eq!(repo.get_user_urls("u1").await.unwrap(), kept);
    assert!(repo.get_user_urls("nobody").await.unwrap().is_empty());
}

pub async fn stats_count_records_and_owners(repo: &dyn UrlRepository) {
    assert_eq!(repo.get_stats().await.unwrap(), StorageStats::default());

    repo.create_short_url("u1", BASE, "https://one.example.com")
        .await
        .unwrap();
    let deleted = repo
        .create_short_url("u1", BASE, "https://two.example.com")
        .await
        .unwrap();
    repo.create_short_url("u2", BASE, "https://three.example.com")
        .await
        .unwrap();
    repo.delete_urls("u1", &[code_of(&deleted).to_string()])
        .await
        .unwrap();

    assert_eq!(
        repo.get_stats().await.unwrap(),
        StorageStats { urls: 3, users: 2 }
    );
}

pub async fn ping_succeeds(repo: &dyn UrlRepository) {
    repo.ping().await.unwrap();
}

pub async fn shorten_resolve_list_scenario(repo: &dyn UrlRepository) {
    let short_url = repo
        .create_short_url("u1", BASE, "https://example.com")
        .await
        .unwrap();
    assert!(short_url.starts_with(BASE));
    assert_eq!(short_url.len(), BASE.len() + 6);

    let err = repo
        .create_short_url("u2", BASE, "https://example.com")
        .await
        .unwrap_err();
    assert_eq!(err.existing_short_url(), Some(short_url.as_str()));

    let listed = repo.get_user_urls("u1").await.unwrap();
    assert_eq!(
        listed,
        vec![UrlPair {
            short_code: code_of(&short_url).to_string(),
            original_url: "https://example.com".to_string(),
        }]
    );
}

pub async fn batch_reports_first_offender_in_input_order(repo: &dyn UrlRepository) {
    let stored = repo
        .create_short_url("u1", BASE, "https://stored.example.com")
        .await
        .unwrap();

    // A stored URL ahead of a repeated pair is reported with its short URL.
    let err = repo
        .batch_create_short_url(
            "u1",
            BASE,
            vec![
                BatchRequest::new("1", "https://stored.example.com"),
                BatchRequest::new("2", "https://x.example.com"),
                BatchRequest::new("3", "https://x.example.com"),
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(err.existing_short_url(), Some(stored.as_str()));

    // A repeated pair ahead of a stored URL is reported without one.
    let err = repo
        .batch_create_short_url(
            "u1",
            BASE,
            vec![
                BatchRequest::new("1", "https://y.example.com"),
                BatchRequest::new("2", "https://y.example.com"),
                BatchRequest::new("3", "https://stored.example.com"),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { short_url: None }));

    // With several stored URLs, the earliest one in the batch wins.
    let later = repo
        .create_short_url("u2", BASE, "https://later.example.com")
        .await
        .unwrap();
    let err = repo
        .batch_create_short_url(
            "u1",
            BASE,
            vec![
                BatchRequest::new("1", "https://fresh.example.com"),
                BatchRequest::new("2", "https://later.example.com"),
                BatchRequest::new("3", "https://stored.example.com"),
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(err.existing_short_url(), Some(later.as_str()));

    assert_eq!(repo.get_stats().await.unwrap().urls, 2);
}
