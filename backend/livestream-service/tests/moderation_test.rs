mod common;

use common::Harness;
use livestream_service::{EntityStore, LivestreamError};

#[tokio::test]
async fn test_ng_word_purges_only_the_moderated_livestream() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let viewer = harness.register("viewer").await;
    let moderated = harness.reserve(&owner, 0).await;
    let other = harness.reserve(&owner, 4).await;

    let comments = &harness.services.livecomments;
    comments.post(&viewer, moderated.id, "hello world", 0).await.unwrap();
    comments.post(&viewer, moderated.id, "fine", 100).await.unwrap();
    comments.post(&viewer, other.id, "hello world", 0).await.unwrap();

    let outcome = comments.moderate(&owner, moderated.id, "world").await.unwrap();
    assert_eq!(outcome.purged_livecomments, 1);
    assert_eq!(outcome.ng_word.word, "world");
    assert_eq!(outcome.ng_word.user_id, owner.user_id);

    let remaining = comments.list(moderated.id, None).await.unwrap();
    assert_eq!(
        remaining.iter().map(|c| c.comment.as_str()).collect::<Vec<_>>(),
        vec!["fine"]
    );
    let untouched = comments.list(other.id, None).await.unwrap();
    assert_eq!(untouched.len(), 1);
    assert_eq!(untouched[0].comment, "hello world");
}

#[tokio::test]
async fn test_new_comments_hitting_ng_word_are_rejected() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let viewer = harness.register("viewer").await;
    let moderated = harness.reserve(&owner, 0).await;
    let other = harness.reserve(&owner, 4).await;

    let comments = &harness.services.livecomments;
    comments.moderate(&owner, moderated.id, "spam").await.unwrap();

    let rejected = comments.post(&viewer, moderated.id, "buy spammy things", 0).await;
    assert!(matches!(rejected, Err(LivestreamError::Spam)));
    assert!(harness.store.all_livecomments().is_empty());

    let accepted = comments.post(&viewer, other.id, "buy spammy things", 0).await.unwrap();
    assert_eq!(accepted.user.name, "viewer");
    assert_eq!(accepted.livestream.owner.name, "streamer");
}

#[tokio::test]
async fn test_non_owner_moderation_changes_nothing() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let intruder = harness.register("intruder").await;
    let livestream = harness.reserve(&owner, 0).await;

    let comments = &harness.services.livecomments;
    comments.post(&intruder, livestream.id, "hello world", 0).await.unwrap();

    let result = comments.moderate(&intruder, livestream.id, "world").await;
    assert!(matches!(result, Err(LivestreamError::Forbidden(_))));

    assert_eq!(harness.store.all_livecomments().len(), 1);
    assert!(harness.store().select_ng_words().await.unwrap().is_empty());
    assert!(comments.ng_words(&owner, livestream.id).is_empty());
    assert!(comments.ng_words(&intruder, livestream.id).is_empty());
}

#[tokio::test]
async fn test_empty_ng_word_is_rejected_before_any_write() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let livestream = harness.reserve(&owner, 0).await;
    harness
        .services
        .livecomments
        .post(&owner, livestream.id, "anything", 0)
        .await
        .unwrap();

    let result = harness
        .services
        .livecomments
        .moderate(&owner, livestream.id, "")
        .await;
    assert!(matches!(result, Err(LivestreamError::InvalidInput(_))));
    assert_eq!(harness.store.all_livecomments().len(), 1);
}

#[tokio::test]
async fn test_moderating_unknown_livestream_is_not_found() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;

    let result = harness
        .services
        .livecomments
        .moderate(&owner, 404, "word")
        .await;
    assert!(matches!(result, Err(LivestreamError::NotFound(_))));
}

#[tokio::test]
async fn test_ng_words_listed_newest_first() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let livestream = harness.reserve(&owner, 0).await;

    let comments = &harness.services.livecomments;
    for word in ["one", "two", "three"] {
        comments.moderate(&owner, livestream.id, word).await.unwrap();
    }

    let words = comments.ng_words(&owner, livestream.id);
    assert_eq!(
        words.iter().map(|w| w.word.as_str()).collect::<Vec<_>>(),
        vec!["three", "two", "one"]
    );
}

#[tokio::test]
async fn test_comment_listing_newest_first_with_limit() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let viewer = harness.register("viewer").await;
    let livestream = harness.reserve(&owner, 0).await;

    let comments = &harness.services.livecomments;
    for text in ["a", "b", "c"] {
        comments.post(&viewer, livestream.id, text, 0).await.unwrap();
    }

    let latest = comments.list(livestream.id, Some(2)).await.unwrap();
    assert_eq!(
        latest.iter().map(|c| c.comment.as_str()).collect::<Vec<_>>(),
        vec!["c", "b"]
    );
    assert!(latest.iter().all(|c| c.livestream.id == livestream.id));
}

#[tokio::test]
async fn test_negative_comment_limit_is_rejected() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let livestream = harness.reserve(&owner, 0).await;
    harness
        .services
        .livecomments
        .post(&owner, livestream.id, "first", 0)
        .await
        .unwrap();
    harness.store.fail("select_livecomments");

    // Rejected before the store is consulted.
    let result = harness.services.livecomments.list(livestream.id, Some(-1)).await;
    assert!(matches!(result, Err(LivestreamError::InvalidInput(_))));

    harness.store.recover("select_livecomments");
    let empty = harness.services.livecomments.list(livestream.id, Some(0)).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_comment_author_resolved_from_store_when_not_cached() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let livestream = harness.reserve(&owner, 0).await;
    let late = harness
        .store()
        .insert_user(common::new_user("late"))
        .await
        .unwrap();
    let session = livestream_service::SessionValues::new(late.id, late.name.clone());

    let view = harness
        .services
        .livecomments
        .post(&session, livestream.id, "hi", 0)
        .await
        .unwrap();
    assert_eq!(view.user.name, "late");
    assert_eq!(view.user.icon_hash, harness.config.fallback_icon_hash);
}
