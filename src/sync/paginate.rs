//! Offset pagination over the catalog under a fixed request pace.
//!
//! Every collection in crate-digger goes through [`Collector`]: it asks for
//! one page at a time, waits a fixed delay between requests so the remote
//! rate limit is never hit, and hands each page to a step function that
//! decides what to keep and whether to carry on. Any failed page aborts the
//! whole collection.

use std::{future::Future, time::Duration};

use indicatif::ProgressBar;
use tokio::time::sleep;
use tracing::debug;

use crate::{
    spotify::{CatalogApi, CatalogError, MAX_PAGE_LIMIT},
    types::{Paging, Playlist, PlaylistItem, SavedTrack, TrackEntry},
    utils::YearMonth,
};

/// Default pause between two page requests.
pub const PAGE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u32,
    pub has_next: bool,
}

impl<T> From<Paging<T>> for Page<T> {
    fn from(paging: Paging<T>) -> Self {
        Page {
            items: paging.items,
            total: paging.total,
            has_next: paging.next.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Collector {
    page_size: u32,
    delay: Duration,
    progress: ProgressBar,
}

impl Default for Collector {
    fn default() -> Self {
        Collector::new(MAX_PAGE_LIMIT, PAGE_DELAY)
    }
}

impl Collector {
    pub fn new(page_size: u32, delay: Duration) -> Self {
        Collector {
            page_size: page_size.clamp(1, MAX_PAGE_LIMIT),
            delay,
            progress: ProgressBar::hidden(),
        }
    }

    /// Reports "Fetched N of M" on `progress` while paging.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn finish(&self) {
        self.progress.finish_and_clear();
    }

    /// Pages from `start` until the remote runs out or `step` says stop.
    ///
    /// `fetch` receives `(offset, limit)`. `step` receives each page's items
    /// together with the output collected so far. The offset always advances
    /// by the number of items the page actually returned; an empty page ends
    /// the loop.
    pub async fn collect<T, U, F, Fut, S>(
        &self,
        start: u32,
        mut fetch: F,
        mut step: S,
    ) -> Result<Vec<U>, CatalogError>
    where
        F: FnMut(u32, u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, CatalogError>>,
        S: FnMut(Vec<T>, &mut Vec<U>) -> Flow,
    {
        let mut collected = Vec::new();
        let mut offset = start;
        let mut first = true;

        loop {
            if !first && !self.delay.is_zero() {
                // avoid rate limiting
                sleep(self.delay).await;
            }
            first = false;

            let page = fetch(offset, self.page_size).await?;
            let returned = page.items.len() as u32;
            offset += returned;

            debug!(offset, total = page.total, returned, "fetched page");
            self.progress
                .set_message(format!("Fetched {} of {}", offset, page.total));

            let flow = step(page.items, &mut collected);
            if returned == 0 || !page.has_next || flow == Flow::Stop {
                break;
            }
        }

        Ok(collected)
    }

    /// Pages to exhaustion keeping every item.
    pub async fn collect_all<T, F, Fut>(&self, fetch: F) -> Result<Vec<T>, CatalogError>
    where
        F: FnMut(u32, u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, CatalogError>>,
    {
        self.collect(0, fetch, |items, out| {
            out.extend(items);
            Flow::Continue
        })
        .await
    }
}

/// Saved tracks added during `target`, in source order.
///
/// Saved tracks arrive newest first. Paging stops on the first page that has
/// no match and whose last item is older than `target`; a page without
/// matches that still ends inside or after `target` does not stop the walk.
pub async fn collect_tracks_for_month<C>(
    api: &C,
    collector: &Collector,
    target: YearMonth,
) -> Result<Vec<TrackEntry>, CatalogError>
where
    C: CatalogApi + ?Sized,
{
    collector
        .collect(
            0,
            |offset, limit| async move { api.get_saved_tracks(limit, offset).await.map(Page::from) },
            |items: Vec<SavedTrack>, out: &mut Vec<TrackEntry>| {
                let last = items.last().map(|t| YearMonth::of(&t.added_at));
                let mut matched = 0;

                for saved in items {
                    if YearMonth::of(&saved.added_at) == target {
                        matched += 1;
                        if let Some(entry) = TrackEntry::from_saved(saved) {
                            out.push(entry);
                        }
                    }
                }

                debug!(matched, month = %target.label(), "tracks in month on page");
                match last {
                    Some(last) if matched == 0 && last < target => Flow::Stop,
                    _ => Flow::Continue,
                }
            },
        )
        .await
}

/// Saved tracks from `offset`, stopping once at least `max` have been read.
pub async fn collect_saved_tracks<C>(
    api: &C,
    collector: &Collector,
    offset: u32,
    max: usize,
) -> Result<Vec<TrackEntry>, CatalogError>
where
    C: CatalogApi + ?Sized,
{
    let mut seen = 0usize;
    collector
        .collect(
            offset,
            |at, limit| async move { api.get_saved_tracks(limit, at).await.map(Page::from) },
            |items: Vec<SavedTrack>, out: &mut Vec<TrackEntry>| {
                seen += items.len();
                out.extend(items.into_iter().filter_map(TrackEntry::from_saved));
                if seen >= max {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            },
        )
        .await
}

/// Every track of a playlist, skipping local files and removed items.
pub async fn collect_playlist_tracks<C>(
    api: &C,
    collector: &Collector,
    playlist_id: &str,
) -> Result<Vec<TrackEntry>, CatalogError>
where
    C: CatalogApi + ?Sized,
{
    let items: Vec<PlaylistItem> = collector
        .collect_all(|offset, limit| async move {
            api.get_playlist_tracks(playlist_id, limit, offset)
                .await
                .map(Page::from)
        })
        .await?;

    Ok(items
        .into_iter()
        .filter_map(TrackEntry::from_playlist_item)
        .collect())
}

/// Every playlist the user follows or owns.
pub async fn collect_playlists<C>(
    api: &C,
    collector: &Collector,
) -> Result<Vec<Playlist>, CatalogError>
where
    C: CatalogApi + ?Sized,
{
    collector
        .collect_all(|offset, limit| async move {
            api.get_user_playlists(limit, offset).await.map(Page::from)
        })
        .await
}
