mod common;

use common::{new_livestream, new_user, Harness};
use livestream_service::models::tag;
use livestream_service::services::users::icon_hash;
use livestream_service::{EntityStore, LivestreamError};

#[tokio::test]
async fn test_reservation_consumes_capacity_until_exhausted() {
    let harness = Harness::with_slot_capacity(1);
    let first = harness.register("first").await;
    let second = harness.register("second").await;

    let view = harness
        .services
        .livestreams
        .reserve(&first, new_livestream(harness.slot_start(10), vec![]))
        .await
        .unwrap();
    assert_eq!(view.owner.name, "first");
    assert_eq!(harness.store.remaining_capacity(10), Some(0));
    assert_eq!(harness.store.remaining_capacity(11), Some(0));
    assert_eq!(harness.store.remaining_capacity(12), Some(1));

    let result = harness
        .services
        .livestreams
        .reserve(&second, new_livestream(harness.slot_start(11), vec![]))
        .await;
    assert!(matches!(
        result,
        Err(LivestreamError::ReservationUnavailable {
            start_slot: 11,
            end_slot: 12
        })
    ));
    // Nothing was taken from the slot that still had room.
    assert_eq!(harness.store.remaining_capacity(12), Some(1));
    assert_eq!(harness.store().select_livestreams().await.unwrap().len(), 1);
    assert_eq!(harness.caches.livestreams.len(), 1);
}

#[tokio::test]
async fn test_reservation_outside_term_is_rejected() {
    let harness = Harness::new();
    let session = harness.register("streamer").await;
    let term_end = harness.config.reservation_term_end;

    let result = harness
        .services
        .livestreams
        .reserve(&session, new_livestream(term_end, vec![]))
        .await;
    assert!(matches!(result, Err(LivestreamError::InvalidInput(_))));
    assert!(harness.caches.livestreams.is_empty());
}

#[tokio::test]
async fn test_window_inside_one_slot_is_unavailable() {
    let harness = Harness::new();
    let session = harness.register("streamer").await;

    let mut request = new_livestream(harness.slot_start(3) + 10, vec![]);
    request.end_at = request.start_at + 600;
    let result = harness.services.livestreams.reserve(&session, request).await;
    assert!(matches!(
        result,
        Err(LivestreamError::ReservationUnavailable {
            start_slot: 4,
            end_slot: 3
        })
    ));
    assert_eq!(harness.store.remaining_capacity(3), Some(5));
    assert_eq!(harness.store.remaining_capacity(4), Some(5));
    assert!(harness.store().select_livestreams().await.unwrap().is_empty());
    assert!(harness.caches.livestreams.is_empty());
}

#[tokio::test]
async fn test_extreme_start_is_invalid_input() {
    let harness = Harness::new();
    let session = harness.register("streamer").await;

    let mut request = new_livestream(i64::MIN, vec![]);
    request.end_at = harness.slot_start(1);
    let result = harness.services.livestreams.reserve(&session, request).await;
    assert!(matches!(result, Err(LivestreamError::InvalidInput(_))));
    assert_eq!(harness.store.remaining_capacity(0), Some(5));
}

#[tokio::test]
async fn test_reserved_livestream_view_decodes_tags() {
    let harness = Harness::new();
    let session = harness.register("streamer").await;

    let view = harness
        .services
        .livestreams
        .reserve(&session, new_livestream(harness.slot_start(0), vec![3, 1]))
        .await
        .unwrap();
    assert_eq!(view.tags.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 1]);
    assert_eq!(view.tags[0].name, tag::TAG_NAMES[2]);

    let cached = harness.caches.livestreams.get(view.id).unwrap();
    assert_eq!(cached.raw_tags, "3,1");
    assert_eq!(cached.user_id, session.user_id);
    assert_eq!(harness.store.tag_ids(view.id), vec![3, 1]);
}

#[tokio::test]
async fn test_unknown_tag_is_rejected() {
    let harness = Harness::new();
    let session = harness.register("streamer").await;

    let result = harness
        .services
        .livestreams
        .reserve(&session, new_livestream(harness.slot_start(0), vec![10_000]))
        .await;
    assert!(matches!(result, Err(LivestreamError::InvalidInput(_))));
    assert_eq!(harness.store.remaining_capacity(0), Some(5));
}

#[tokio::test]
async fn test_reserved_user_name() {
    let harness = Harness::new();
    let result = harness.services.users.register(new_user("pipe")).await;
    assert!(matches!(result, Err(LivestreamError::InvalidInput(_))));
    assert!(harness.caches.users.is_empty());
}

#[tokio::test]
async fn test_icon_update_refreshes_cached_user_only() {
    let harness = Harness::new();
    let cached = harness.register("cached").await;
    let uncached = harness.store().insert_user(new_user("uncached")).await.unwrap();
    let uncached = livestream_service::SessionValues::new(uncached.id, uncached.name);

    let image = b"\x89PNG fake image bytes";
    harness.services.users.update_icon(&cached, image).await.unwrap();
    harness.services.users.update_icon(&uncached, image).await.unwrap();

    let profile = harness.services.users.profile_by_name("cached").await.unwrap();
    assert_eq!(profile.icon_hash, icon_hash(image));
    assert!(harness.caches.users.get(uncached.user_id).is_none());

    let stored = harness.store().find_user(uncached.user_id).await.unwrap().unwrap();
    assert_eq!(stored.icon_hash, icon_hash(image));
    let icon = harness.store().find_icon(uncached.user_id).await.unwrap();
    assert_eq!(icon.as_deref(), Some(&image[..]));
}

#[tokio::test]
async fn test_new_user_gets_fallback_icon_and_theme() {
    let harness = Harness::new();
    let session = harness.register("fresh").await;

    let profile = harness.services.users.profile_by_name("fresh").await.unwrap();
    assert_eq!(profile.icon_hash, harness.config.fallback_icon_hash);
    assert_eq!(profile.id, session.user_id);

    let theme = harness.services.users.theme("fresh").await.unwrap();
    assert_eq!(theme.id, session.user_id);
    assert!(!theme.dark_mode);
}

#[tokio::test]
async fn test_livestream_lookups_fall_back_to_store() {
    let harness = Harness::new();
    let session = harness.register("streamer").await;
    let cached = harness.reserve(&session, 0).await;

    let mut request = new_livestream(harness.slot_start(4), vec![2]);
    request.user_id = session.user_id;
    let uncached = harness.store.insert_livestream_row(request);

    let found = harness
        .services
        .livestreams
        .get_many(&[uncached.id, cached.id, 999])
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[&uncached.id], uncached);
    assert!(harness.caches.livestreams.get(uncached.id).is_none());

    let view = harness
        .services
        .livestreams
        .view_by_id(uncached.id)
        .await
        .unwrap();
    assert_eq!(view.owner.id, session.user_id);
    assert_eq!(view.tags.len(), 1);
}
