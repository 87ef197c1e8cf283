//! Cursor movement, prefetching and the service operations built on them.

use std::time::Duration;

use anyhow::Result;
use artframe_core::{
    AssetError, PrefetchOutcome, PrefetchReport,
    infra::{CursorKey, MetadataStore, Partition},
};
use artframe_model::{CacheKind, UpdateFrequency};

#[path = "support/mod.rs"]
mod support;

use support::{BASE_URL, CATALOG_URL, HOUR, Harness, image_url, settle, test_config};

fn no_prefetch() -> artframe_core::AssetConfig {
    let mut config = test_config();
    config.prefetch_window = 0;
    config
}

async fn stored_cursor(harness: &Harness) -> Result<Option<i64>> {
    let metadata = MetadataStore::new(harness.store.clone());
    Ok(metadata.get::<CursorKey>().await?)
}

#[tokio::test]
async fn image_at_is_idempotent_and_resolves_links() -> Result<()> {
    let harness = Harness::with_config(6, no_prefetch());

    let first = harness.service.image_at(2).await?;
    let second = harness.service.image_at(2).await?;

    assert_eq!(first, second);
    assert_eq!(harness.fetcher.calls_to(&image_url(2)), 1);
    assert_eq!(first.record.title, "Work 2");
    assert_eq!(first.record.link, format!("{BASE_URL}asset/work-2"));
    assert_eq!(first.record.artist_link, format!("{BASE_URL}entity/artist-2"));
    assert!(first.data_url.starts_with("data:image/png;base64,"));
    Ok(())
}

#[tokio::test]
async fn image_at_rejects_out_of_range_indices() {
    let harness = Harness::with_config(3, no_prefetch());

    for index in [-1, 3, 100] {
        let err = harness.service.image_at(index).await.unwrap_err();
        assert_eq!(err, AssetError::InvalidIndex { index, len: 3 });
    }
}

#[tokio::test]
async fn advance_wraps_from_last_to_first() -> Result<()> {
    let harness = Harness::with_config(11, no_prefetch());
    harness.service.set_current_index(10).await?;

    let data = harness.service.next_image().await?;

    assert_eq!(data.record.title, "Work 0");
    assert_eq!(harness.service.current_index().await?, Some(0));
    assert_eq!(stored_cursor(&harness).await?, Some(0));
    Ok(())
}

#[tokio::test]
async fn first_advance_from_unset_cursor_yields_zero() -> Result<()> {
    let harness = Harness::with_config(4, no_prefetch());
    assert_eq!(stored_cursor(&harness).await?, None);
    assert_eq!(harness.service.current_index().await?, Some(0));

    let data = harness.service.next_image().await?;

    assert_eq!(data.record.title, "Work 0");
    Ok(())
}

#[tokio::test]
async fn advancing_n_times_returns_to_start() -> Result<()> {
    let n = 7;
    let harness = Harness::with_config(n, no_prefetch());
    harness.service.set_current_index(3).await?;

    for _ in 0..n {
        harness.service.next_image().await?;
    }

    assert_eq!(harness.service.current_index().await?, Some(3));
    Ok(())
}

#[tokio::test]
async fn retreat_inverts_advance() -> Result<()> {
    let harness = Harness::with_config(5, no_prefetch());
    for start in 0..5 {
        harness.service.set_current_index(start).await?;
        harness.service.next_image().await?;
        let back = harness.service.previous_image().await?;
        assert_eq!(back.record.title, format!("Work {start}"));
    }

    harness.service.set_current_index(0).await?;
    let wrapped = harness.service.previous_image().await?;
    assert_eq!(wrapped.record.title, "Work 4");
    Ok(())
}

#[tokio::test]
async fn set_current_index_validates_range() -> Result<()> {
    let harness = Harness::with_config(3, no_prefetch());

    let err = harness.service.set_current_index(3).await.unwrap_err();
    assert_eq!(err, AssetError::InvalidIndex { index: 3, len: 3 });
    assert_eq!(stored_cursor(&harness).await?, None);

    harness.service.set_current_index(2).await?;
    assert_eq!(harness.service.current_image().await?.record.title, "Work 2");
    Ok(())
}

#[tokio::test]
async fn cursor_beyond_shrunk_catalog_is_normalized() -> Result<()> {
    let harness = Harness::with_config(3, no_prefetch());
    let metadata = MetadataStore::new(harness.store.clone());
    metadata.put::<CursorKey>(&7).await?;

    assert_eq!(harness.service.current_index().await?, Some(1));
    Ok(())
}

#[tokio::test]
async fn current_index_without_catalog_is_none() -> Result<()> {
    let harness = Harness::with_config(3, no_prefetch());
    harness.fetcher.route_status(CATALOG_URL, 500);

    assert_eq!(harness.service.current_index().await?, None);
    assert!(harness.service.current_image().await.is_err());
    Ok(())
}

#[tokio::test]
async fn prefetch_window_tolerates_individual_failures() -> Result<()> {
    let harness = Harness::new(11);
    harness.fetcher.route_status(&image_url(6), 404);
    harness.service.sync().await?;

    let outcome = harness.service.prefetcher().prefetch(3).await;

    assert_eq!(
        outcome,
        PrefetchOutcome::Completed(PrefetchReport {
            requested: 5,
            skipped_cached: 0,
            loaded: 4,
            failed: 1,
        })
    );
    let loader = harness.service.loader();
    for i in [4, 5, 7, 8] {
        assert!(loader.is_cached(&image_url(i)), "index {i} should be cached");
    }
    assert!(!loader.is_cached(&image_url(6)));
    assert!(!loader.is_cached(&image_url(3)));
    assert!(!loader.is_cached(&image_url(9)));
    Ok(())
}

#[tokio::test]
async fn prefetch_skips_resident_entries() -> Result<()> {
    let harness = Harness::new(11);
    harness.service.sync().await?;
    harness.service.prefetcher().prefetch(3).await;

    let outcome = harness.service.prefetcher().prefetch(4).await;

    assert_eq!(
        outcome,
        PrefetchOutcome::Completed(PrefetchReport {
            requested: 5,
            skipped_cached: 4,
            loaded: 1,
            failed: 0,
        })
    );
    assert_eq!(harness.fetcher.calls_to(&image_url(5)), 1);
    Ok(())
}

#[tokio::test]
async fn overlapping_sweeps_are_skipped() -> Result<()> {
    let harness = Harness::new(11);
    harness.service.sync().await?;
    harness.fetcher.set_delay(Duration::from_millis(100));

    let prefetcher = harness.service.prefetcher();
    let (first, second) =
        tokio::join!(prefetcher.prefetch(0), prefetcher.prefetch(0));

    assert!(matches!(first, PrefetchOutcome::Completed(_)));
    assert_eq!(second, PrefetchOutcome::Skipped);

    // Once the first sweep finished, new ones run again.
    assert!(matches!(
        prefetcher.prefetch(5).await,
        PrefetchOutcome::Completed(_)
    ));
    Ok(())
}

#[tokio::test]
async fn advancing_warms_the_window_in_the_background() -> Result<()> {
    let harness = Harness::new(11);

    harness.service.next_image().await?;
    settle().await;

    for i in 1..=5 {
        assert_eq!(harness.fetcher.calls_to(&image_url(i)), 1, "index {i}");
    }
    assert_eq!(harness.fetcher.calls_to(&image_url(6)), 0);
    Ok(())
}

#[tokio::test]
async fn memory_tier_stays_bounded_during_navigation() -> Result<()> {
    let mut config = test_config();
    config.memory_cache_capacity = 3;
    config.prefetch_window = 0;
    let harness = Harness::with_config(12, config.clone());

    for _ in 0..12 {
        harness.service.next_image().await?;
    }

    // Only the last three images are resident; the oldest ones reload.
    let loader = harness.service.loader();
    let resident: Vec<usize> =
        (0..12).filter(|i| loader.is_cached(&image_url(*i))).collect();
    assert_eq!(resident, vec![9, 10, 11]);
    assert_eq!(harness.store.len(Partition::Images), 12);
    Ok(())
}

#[tokio::test]
async fn new_tab_rotation_follows_update_frequency() -> Result<()> {
    let harness = Harness::with_config(5, no_prefetch());
    harness
        .service
        .set_update_frequency(UpdateFrequency::EveryHour)
        .await?;

    // First new tab always rotates.
    let first = harness.service.new_tab_image().await?;
    assert_eq!(first.record.title, "Work 0");

    harness.clock.advance(Duration::from_secs(30 * 60));
    let same = harness.service.new_tab_image().await?;
    assert_eq!(same.record.title, "Work 0");

    harness.clock.advance(HOUR);
    let next = harness.service.new_tab_image().await?;
    assert_eq!(next.record.title, "Work 1");
    Ok(())
}

#[tokio::test]
async fn every_tab_rotates_on_each_new_tab() -> Result<()> {
    let harness = Harness::with_config(3, no_prefetch());
    assert_eq!(
        harness.service.update_frequency().await?,
        UpdateFrequency::EveryTab
    );

    let titles = [
        harness.service.new_tab_image().await?.record.title,
        harness.service.new_tab_image().await?.record.title,
        harness.service.new_tab_image().await?.record.title,
        harness.service.new_tab_image().await?.record.title,
    ];
    assert_eq!(titles, ["Work 0", "Work 1", "Work 2", "Work 0"]);
    Ok(())
}

#[tokio::test]
async fn clearing_images_keeps_metadata() -> Result<()> {
    let harness = Harness::with_config(4, no_prefetch());
    harness.service.set_current_index(2).await?;
    harness.service.current_image().await?;

    harness.service.clear_cache(CacheKind::Images).await?;

    assert!(harness.store.is_empty(Partition::Images));
    assert!(!harness.service.loader().is_cached(&image_url(2)));
    assert_eq!(harness.service.current_index().await?, Some(2));

    harness.service.current_image().await?;
    assert_eq!(harness.fetcher.calls_to(&image_url(2)), 2);
    Ok(())
}

#[tokio::test]
async fn clearing_metadata_forces_a_new_sync() -> Result<()> {
    let harness = Harness::with_config(4, no_prefetch());
    harness.service.set_current_index(3).await?;

    harness.service.clear_cache(CacheKind::Metadata).await?;

    assert!(harness.store.is_empty(Partition::Metadata));
    assert_eq!(harness.service.current_index().await?, Some(0));
    assert_eq!(harness.fetcher.calls_to(CATALOG_URL), 2);
    Ok(())
}

#[tokio::test]
async fn slow_operations_time_out() {
    let mut config = no_prefetch();
    config.request_timeout = Duration::from_millis(50);
    let harness = Harness::with_config(3, config);
    harness.fetcher.set_delay(Duration::from_millis(500));

    let err = harness.service.image_at(0).await.unwrap_err();

    assert_eq!(err, AssetError::Timeout(Duration::from_millis(50)));
}

#[tokio::test]
async fn warm_up_loads_current_and_window() -> Result<()> {
    let mut config = test_config();
    config.prefetch_window = 2;
    let harness = Harness::with_config(6, config);
    {
        let metadata = MetadataStore::new(harness.store.clone());
        metadata.put::<CursorKey>(&4).await?;
    }

    let outcome = harness.service.warm_up().await;

    assert!(matches!(
        outcome,
        PrefetchOutcome::Completed(PrefetchReport { loaded: 2, .. })
    ));
    let loader = harness.service.loader();
    for i in [4, 5, 0] {
        assert!(loader.is_cached(&image_url(i)), "index {i}");
    }
    Ok(())
}
