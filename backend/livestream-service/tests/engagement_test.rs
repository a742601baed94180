mod common;

use common::{new_livestream, Harness};
use livestream_service::models::tag;
use livestream_service::services::users::icon_hash;
use livestream_service::services::IconImage;
use livestream_service::LivestreamError;

#[tokio::test]
async fn test_reactions_listed_newest_first() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let viewer = harness.register("viewer").await;
    let livestream = harness.reserve(&owner, 0).await;

    let reactions = &harness.services.reactions;
    let posted = reactions.post(&viewer, livestream.id, "heart").await.unwrap();
    assert_eq!(posted.user.name, "viewer");
    assert_eq!(posted.livestream.owner.name, "streamer");
    reactions.post(&owner, livestream.id, "tada").await.unwrap();
    reactions.post(&viewer, livestream.id, "smile").await.unwrap();

    // Timestamps are whole seconds, so the id breaks ties.
    let all = reactions.list(livestream.id, None).await.unwrap();
    assert_eq!(
        all.iter().map(|r| r.emoji_name.as_str()).collect::<Vec<_>>(),
        vec!["smile", "tada", "heart"]
    );
    assert_eq!(all[1].user.name, "streamer");

    let latest = reactions.list(livestream.id, Some(1)).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].emoji_name, "smile");
}

#[tokio::test]
async fn test_reaction_validation() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let livestream = harness.reserve(&owner, 0).await;
    let reactions = &harness.services.reactions;

    assert!(matches!(
        reactions.post(&owner, livestream.id, "").await,
        Err(LivestreamError::InvalidInput(_))
    ));
    assert!(matches!(
        reactions.post(&owner, 999, "heart").await,
        Err(LivestreamError::NotFound(_))
    ));
    assert!(matches!(
        reactions.list(livestream.id, Some(-5)).await,
        Err(LivestreamError::InvalidInput(_))
    ));
    assert!(reactions.list(livestream.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reports_are_visible_to_the_owner_only() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let viewer = harness.register("viewer").await;
    let livestream = harness.reserve(&owner, 0).await;

    let comments = &harness.services.livecomments;
    let comment = comments.post(&viewer, livestream.id, "rude", 0).await.unwrap();
    let report = comments.report(&owner, livestream.id, comment.id).await.unwrap();
    assert_eq!(report.reporter.name, "streamer");
    assert_eq!(report.livecomment.id, comment.id);
    assert_eq!(report.livecomment.user.name, "viewer");

    let reports = comments.reports(&owner, livestream.id).await.unwrap();
    assert_eq!(reports, vec![report]);

    assert!(matches!(
        comments.reports(&viewer, livestream.id).await,
        Err(LivestreamError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_report_needs_a_comment_on_that_livestream() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let viewer = harness.register("viewer").await;
    let livestream = harness.reserve(&owner, 0).await;
    let other = harness.reserve(&owner, 4).await;

    let comments = &harness.services.livecomments;
    let elsewhere = comments.post(&viewer, other.id, "hi", 0).await.unwrap();

    assert!(matches!(
        comments.report(&viewer, livestream.id, elsewhere.id).await,
        Err(LivestreamError::NotFound(_))
    ));
    assert!(matches!(
        comments.report(&viewer, livestream.id, 999).await,
        Err(LivestreamError::NotFound(_))
    ));
    assert!(comments.reports(&owner, livestream.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reports_on_purged_comments_are_skipped() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let viewer = harness.register("viewer").await;
    let livestream = harness.reserve(&owner, 0).await;

    let comments = &harness.services.livecomments;
    let spam = comments.post(&viewer, livestream.id, "buy now", 0).await.unwrap();
    let kept = comments.post(&viewer, livestream.id, "hello", 0).await.unwrap();
    comments.report(&owner, livestream.id, spam.id).await.unwrap();
    comments.report(&owner, livestream.id, kept.id).await.unwrap();

    comments.moderate(&owner, livestream.id, "buy").await.unwrap();

    let reports = comments.reports(&owner, livestream.id).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].livecomment.id, kept.id);
}

#[tokio::test]
async fn test_viewer_enter_and_exit() {
    let harness = Harness::new();
    let owner = harness.register("streamer").await;
    let viewer = harness.register("viewer").await;
    let livestream = harness.reserve(&owner, 0).await;
    let livestreams = &harness.services.livestreams;

    livestreams.enter(&viewer, livestream.id).await.unwrap();
    livestreams.enter(&viewer, livestream.id).await.unwrap();
    assert_eq!(livestreams.exit(&viewer, livestream.id).await.unwrap(), 2);
    assert_eq!(livestreams.exit(&viewer, livestream.id).await.unwrap(), 0);

    assert!(matches!(
        livestreams.enter(&viewer, 999).await,
        Err(LivestreamError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_search_by_tag_newest_first() {
    let harness = Harness::new();
    let session = harness.register("streamer").await;
    let livestreams = &harness.services.livestreams;

    let games = livestreams
        .reserve(&session, new_livestream(harness.slot_start(0), vec![2]))
        .await
        .unwrap();
    let music = livestreams
        .reserve(&session, new_livestream(harness.slot_start(2), vec![22]))
        .await
        .unwrap();
    let both = livestreams
        .reserve(&session, new_livestream(harness.slot_start(4), vec![2, 22]))
        .await
        .unwrap();

    let tagged = livestreams.search(Some(tag::TAG_NAMES[1]), None).await.unwrap();
    assert_eq!(
        tagged.iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![both.id, games.id]
    );

    let everything = livestreams.search(None, None).await.unwrap();
    assert_eq!(
        everything.iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![both.id, music.id, games.id]
    );
    let latest = livestreams.search(None, Some(1)).await.unwrap();
    assert_eq!(latest[0].id, both.id);
    assert_eq!(latest[0].owner.name, "streamer");
}

#[tokio::test]
async fn test_search_validation() {
    let harness = Harness::new();
    let livestreams = &harness.services.livestreams;

    assert!(matches!(
        livestreams.search(Some("no such tag"), None).await,
        Err(LivestreamError::NotFound(_))
    ));
    assert!(matches!(
        livestreams.search(None, Some(-1)).await,
        Err(LivestreamError::InvalidInput(_))
    ));
    assert!(livestreams.search(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_livestreams_by_owner() {
    let harness = Harness::new();
    let alice = harness.register("alice").await;
    let bob = harness.register("bob").await;
    let first = harness.reserve(&alice, 0).await;
    let second = harness.reserve(&alice, 4).await;
    harness.reserve(&bob, 8).await;

    let livestreams = &harness.services.livestreams;
    let mine = livestreams.mine(&alice).await.unwrap();
    assert_eq!(
        mine.iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
    assert_eq!(livestreams.by_user("bob").await.unwrap().len(), 1);
    assert!(matches!(
        livestreams.by_user("nobody").await,
        Err(LivestreamError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_icon_fetch() {
    let harness = Harness::new();
    let session = harness.register("painter").await;
    let users = &harness.services.users;

    assert_eq!(users.icon("painter", None).await.unwrap(), IconImage::Fallback);
    let fallback_etag = format!("\"{}\"", harness.config.fallback_icon_hash);
    assert_eq!(
        users.icon("painter", Some(&fallback_etag)).await.unwrap(),
        IconImage::NotModified
    );

    let image = b"\x89PNG painted";
    users.update_icon(&session, image).await.unwrap();
    assert_eq!(
        users.icon("painter", Some(&fallback_etag)).await.unwrap(),
        IconImage::Image(image.to_vec())
    );
    let etag = format!("\"{}\"", icon_hash(image));
    assert_eq!(
        users.icon("painter", Some(&etag)).await.unwrap(),
        IconImage::NotModified
    );

    assert!(matches!(
        users.icon("nobody", None).await,
        Err(LivestreamError::NotFound(_))
    ));
}
