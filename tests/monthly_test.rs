mod common;

use std::time::Duration;

use common::{FakeCatalog, FakeInteraction, at, item, playlist, saved_run};
use crate_digger::{
    spotify::CatalogError,
    sync::{
        BuildError, BuildOutcome, Collector, CompareOutcome, MonthlyPlaylistBuilder,
        compare::{compare_with_library, fill_from_library},
        monthly::add_in_batches,
    },
    types::SavedTrack,
    utils::YearMonth,
};

fn collector() -> Collector {
    Collector::new(50, Duration::ZERO)
}

fn march() -> YearMonth {
    YearMonth::new(2024, 3).unwrap()
}

/// 250 March tracks followed by a page of February.
fn library() -> Vec<SavedTrack> {
    let mut saved = saved_run("mar", 250, at(2024, 3, 28));
    saved.extend(saved_run("feb", 50, at(2024, 2, 10)));
    saved
}

#[tokio::test]
async fn test_build_creates_private_playlist_in_batches() {
    let api = FakeCatalog {
        saved: library(),
        ..Default::default()
    };
    let collector = collector();
    let interaction = FakeInteraction::answering(true);
    let builder = MonthlyPlaylistBuilder::new(&api, &collector, &interaction);

    let outcome = builder.build("spotify-dj", march()).await.unwrap();

    match outcome {
        BuildOutcome::Created {
            playlist_id,
            name,
            url,
            tracks,
        } => {
            assert_eq!(playlist_id, "created-1");
            assert_eq!(name, "Liked - March 2024");
            assert_eq!(url, "https://open.spotify.com/playlist/created-1");
            assert_eq!(tracks, 250);
        }
        other => panic!("expected a playlist, got {:?}", other),
    }

    let created = api.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, "spotify-dj");
    assert!(!created[0].1.public);

    assert_eq!(api.add_sizes(), vec![100, 100, 50]);

    // batches go out in collection order
    let calls = api.add_calls.lock().unwrap().clone();
    assert_eq!(calls[0].1[0], "spotify:track:mar-0");
    assert_eq!(calls[2].1[49], "spotify:track:mar-249");

    assert_eq!(
        *interaction.shown.lock().unwrap(),
        vec![("Tracks saved in March 2024".to_string(), 250)]
    );
    assert_eq!(interaction.links.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_batch_reports_partial_playlist() {
    let api = FakeCatalog {
        saved: library(),
        fail_add_call: Some(1),
        ..Default::default()
    };
    let collector = collector();
    let interaction = FakeInteraction::answering(true);
    let builder = MonthlyPlaylistBuilder::new(&api, &collector, &interaction);

    let result = builder.build("spotify-dj", march()).await;

    match result {
        Err(BuildError::PartialAdd {
            playlist_url,
            added,
            total,
            source,
        }) => {
            assert_eq!(playlist_url, "https://open.spotify.com/playlist/created-1");
            assert_eq!(added, 100);
            assert_eq!(total, 250);
            assert_eq!(source.status(), Some(502));
        }
        other => panic!("expected a partial add, got {:?}", other),
    }

    // the third batch was never sent, the first one stays
    assert_eq!(api.add_sizes(), vec![100, 100]);
    assert_eq!(api.playlist_len("created-1"), 100);
    assert!(interaction.links.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_declined_confirmation_creates_nothing() {
    let api = FakeCatalog {
        saved: library(),
        ..Default::default()
    };
    let collector = collector();
    let interaction = FakeInteraction::answering(false);
    let builder = MonthlyPlaylistBuilder::new(&api, &collector, &interaction);

    let outcome = builder.build("spotify-dj", march()).await.unwrap();

    assert_eq!(outcome, BuildOutcome::Cancelled);
    assert!(api.created.lock().unwrap().is_empty());
    assert_eq!(
        *interaction.prompts.lock().unwrap(),
        vec!["Create playlist 'Liked - March 2024' with 250 tracks?".to_string()]
    );
}

#[tokio::test]
async fn test_empty_month_asks_nothing() {
    let api = FakeCatalog {
        saved: saved_run("feb", 20, at(2024, 2, 10)),
        ..Default::default()
    };
    let collector = collector();
    let interaction = FakeInteraction::answering(true);
    let builder = MonthlyPlaylistBuilder::new(&api, &collector, &interaction);

    let outcome = builder.build("spotify-dj", march()).await.unwrap();

    assert_eq!(outcome, BuildOutcome::NoTracks);
    assert!(interaction.prompts.lock().unwrap().is_empty());
    assert!(api.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_in_batches_boundaries() {
    let api = FakeCatalog::default();
    let uris: Vec<String> = (0..200).map(|n| format!("spotify:track:{}", n)).collect();

    let added = add_in_batches(&api, "p1", &uris, Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(added, 200);
    assert_eq!(api.add_sizes(), vec![100, 100]);

    let nothing = add_in_batches(&api, "p1", &[], Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(nothing, 0);
    assert_eq!(api.add_sizes().len(), 2);
}

#[tokio::test]
async fn test_add_in_batches_first_call_fails() {
    let api = FakeCatalog {
        fail_add_call: Some(0),
        ..Default::default()
    };
    let uris: Vec<String> = (0..30).map(|n| format!("spotify:track:{}", n)).collect();

    let err = add_in_batches(&api, "p1", &uris, Duration::ZERO)
        .await
        .unwrap_err();

    assert_eq!(err.added, 0);
    assert!(matches!(err.source, CatalogError::Api { status: 502, .. }));
}

fn compare_catalog() -> FakeCatalog {
    FakeCatalog {
        playlists: vec![playlist("p1", "me", 3)],
        saved: saved_run("t", 6, at(2024, 5, 1)),
        ..Default::default()
    }
    .with_items(
        "p1",
        vec![
            item("t-0", at(2024, 1, 1)),
            item("t-2", at(2024, 1, 1)),
            item("elsewhere", at(2024, 1, 1)),
        ],
    )
}

#[tokio::test]
async fn test_compare_lists_missing_saved_tracks() {
    let api = compare_catalog();

    let comparison = compare_with_library(&api, &collector(), "p1", 0, 5)
        .await
        .unwrap();

    assert_eq!(comparison.playlist_tracks, 3);
    assert_eq!(comparison.scanned, 5);
    let missing: Vec<&str> = comparison.missing.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(missing, vec!["t-1", "t-3", "t-4"]);
}

#[tokio::test]
async fn test_fill_from_library_adds_missing_tracks() {
    let api = compare_catalog();
    let interaction = FakeInteraction::answering(true);

    let outcome = fill_from_library(&api, &collector(), &interaction, "p1", 0, 100)
        .await
        .unwrap();

    assert_eq!(outcome, CompareOutcome::Added(4));
    assert_eq!(
        *api.add_calls.lock().unwrap(),
        vec![(
            "p1".to_string(),
            vec![
                "spotify:track:t-1".to_string(),
                "spotify:track:t-3".to_string(),
                "spotify:track:t-4".to_string(),
                "spotify:track:t-5".to_string(),
            ]
        )]
    );

    // a second pass finds nothing left to add
    let again = fill_from_library(&api, &collector(), &interaction, "p1", 0, 100)
        .await
        .unwrap();
    assert_eq!(again, CompareOutcome::UpToDate);
}
