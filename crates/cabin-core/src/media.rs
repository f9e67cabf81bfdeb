//! Media: playlist handling, stream resolution, and progress polling.
//!
//! The playback device itself is an external collaborator; the controller
//! only decides what to resolve and when, and publishes metadata/progress
//! into the state store.

use crate::config;
use crate::state::{MediaInfo, MediaProgress, StateStore};
use crate::worker::{TaskOutcome, TaskOutput, TaskTag, WorkerPool};

/// One playable playlist entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    /// Track title.
    pub title: String,
    /// Artist or uploader.
    pub artist: String,
    /// Reference used to resolve the stream.
    pub stream_ref: String,
}

/// Ordered song list with a wrap-around current index.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    songs: Vec<Song>,
    current: usize,
}

impl Playlist {
    /// Build a playlist from index entries, keeping only entries with a
    /// resolvable reference.
    pub fn from_entries(entries: Vec<crate::providers::PlaylistEntry>) -> Self {
        let songs = entries
            .into_iter()
            .filter_map(|e| {
                let stream_ref = e.url?;
                Some(Song {
                    title: e.title.unwrap_or_else(|| "Unknown Title".to_string()),
                    artist: e.uploader.unwrap_or_else(|| "Unknown Artist".to_string()),
                    stream_ref,
                })
            })
            .collect();
        Self { songs, current: 0 }
    }

    /// Number of playable songs.
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Whether the playlist has no playable songs.
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Current index.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Song at the current index.
    pub fn current(&self) -> Option<&Song> {
        self.songs.get(self.current)
    }

    /// Move the current index by `delta`, wrapping in both directions.
    pub fn step(&mut self, delta: isize) {
        let len = self.songs.len();
        if len == 0 {
            return;
        }
        self.current = (self.current as isize + delta).rem_euclid(len as isize) as usize;
    }
}

/// External audio playback device.
pub trait PlaybackDevice {
    /// Start playing a resolved stream URL, replacing any current stream.
    fn play(&mut self, stream_url: &str);
    /// Toggle pause on the current stream.
    fn toggle_pause(&mut self);
    /// Stop and unload the current stream.
    fn stop(&mut self);
    /// Whether a stream is loaded.
    fn is_loaded(&self) -> bool;
    /// Progress of the active stream, if one is loaded and seekable.
    fn progress(&self) -> Option<MediaProgress>;
}

/// Fetches playlist/stream metadata through the worker pool and maintains
/// the playback index. Lives on the interactive context.
pub struct MediaController {
    playlist: Playlist,
    device: Box<dyn PlaybackDevice>,
    pending_stream: Option<u64>,
    consecutive_skips: usize,
}

impl MediaController {
    /// Create the controller and fetch the default playlist; metadata only,
    /// playback does not start until requested.
    pub fn new(device: Box<dyn PlaybackDevice>, workers: &mut WorkerPool) -> Self {
        workers.submit_fetch_playlist(config::DEFAULT_PLAYLIST_URL);
        Self {
            playlist: Playlist::default(),
            device,
            pending_stream: None,
            consecutive_skips: 0,
        }
    }

    /// Loaded playlist.
    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    /// Apply a playlist or stream outcome.
    pub fn on_task(
        &mut self,
        store: &mut StateStore,
        workers: &mut WorkerPool,
        outcome: TaskOutcome,
    ) {
        match outcome.tag {
            TaskTag::Playlist => match outcome.result {
                Ok(TaskOutput::Playlist(entries)) => {
                    self.playlist = Playlist::from_entries(entries);
                    tracing::info!(songs = self.playlist.len(), "playlist loaded");
                    if let Some(song) = self.playlist.current() {
                        store.set_current_media(MediaInfo::new(&song.title, &song.artist));
                    }
                }
                Ok(_) => tracing::warn!("playlist outcome carried wrong payload"),
                Err(e) => tracing::warn!(error = %e, "playlist fetch failed"),
            },
            TaskTag::Stream => {
                if self.pending_stream != Some(outcome.seq) {
                    tracing::debug!(seq = outcome.seq, "dropping stale stream result");
                    return;
                }
                self.pending_stream = None;
                match outcome.result {
                    Ok(TaskOutput::Stream(info)) => match info.url {
                        Some(url) => {
                            if self.device.is_loaded() {
                                self.device.stop();
                            }
                            self.device.play(&url);
                            self.consecutive_skips = 0;
                            store.set_current_media(MediaInfo::new(
                                info.title.unwrap_or_else(|| "Unknown Title".to_string()),
                                info.uploader.unwrap_or_else(|| "Unknown Artist".to_string()),
                            ));
                        }
                        None => self.skip_unresolvable(workers),
                    },
                    Ok(_) => tracing::warn!("stream outcome carried wrong payload"),
                    Err(e) => {
                        tracing::warn!(error = %e, "stream resolution failed");
                        self.skip_unresolvable(workers);
                    }
                }
            }
            _ => tracing::warn!(tag = ?outcome.tag, "outcome routed to wrong controller"),
        }
    }

    /// Skip an unresolvable track, bounded to one full playlist cycle so an
    /// entirely dead playlist cannot spin forever.
    fn skip_unresolvable(&mut self, workers: &mut WorkerPool) {
        self.consecutive_skips += 1;
        if self.consecutive_skips >= self.playlist.len().max(1) {
            tracing::warn!("no playable track in playlist, giving up");
            self.consecutive_skips = 0;
            return;
        }
        self.next(workers);
    }

    /// Toggle playback. The first press resolves the current track's stream
    /// before any playback state changes.
    pub fn play_pause(&mut self, workers: &mut WorkerPool) {
        if !self.device.is_loaded() {
            if !self.playlist.is_empty() {
                self.resolve_current(workers);
            }
        } else {
            self.device.toggle_pause();
        }
    }

    /// Advance to the next track, wrapping at the end.
    pub fn next(&mut self, workers: &mut WorkerPool) {
        if self.playlist.is_empty() {
            return;
        }
        self.playlist.step(1);
        self.resolve_current(workers);
    }

    /// Go back to the previous track, wrapping at the start.
    pub fn previous(&mut self, workers: &mut WorkerPool) {
        if self.playlist.is_empty() {
            return;
        }
        self.playlist.step(-1);
        self.resolve_current(workers);
    }

    fn resolve_current(&mut self, workers: &mut WorkerPool) {
        if let Some(song) = self.playlist.current() {
            self.pending_stream = Some(workers.submit_resolve_stream(song.stream_ref.clone()));
        }
    }

    /// Publish progress of the active stream, if any. Called at 1 Hz.
    pub fn poll_progress(&mut self, store: &mut StateStore) {
        if let Some(progress) = self.device.progress() {
            if progress.duration_ms > 0 {
                store.set_media_progress(progress);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::PlaylistEntry;
    use crate::testutil::{test_providers, MockMedia};
    use crate::worker::TaskProviders;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// Playback device that records calls.
    #[derive(Default)]
    struct FakeDevice {
        loaded: Option<String>,
        paused: bool,
        plays: Rc<RefCell<Vec<String>>>,
        progress: Rc<RefCell<Option<MediaProgress>>>,
    }

    impl PlaybackDevice for FakeDevice {
        fn play(&mut self, stream_url: &str) {
            self.loaded = Some(stream_url.to_string());
            self.paused = false;
            self.plays.borrow_mut().push(stream_url.to_string());
        }

        fn toggle_pause(&mut self) {
            self.paused = !self.paused;
        }

        fn stop(&mut self) {
            self.loaded = None;
        }

        fn is_loaded(&self) -> bool {
            self.loaded.is_some()
        }

        fn progress(&self) -> Option<MediaProgress> {
            if self.is_loaded() {
                *self.progress.borrow()
            } else {
                None
            }
        }
    }

    struct Rig {
        store: StateStore,
        media: MediaController,
        workers: WorkerPool,
        outcomes: mpsc::UnboundedReceiver<TaskOutcome>,
        plays: Rc<RefCell<Vec<String>>>,
        device_progress: Rc<RefCell<Option<MediaProgress>>>,
    }

    fn rig_with(providers: TaskProviders) -> Rig {
        let (tx, outcomes) = mpsc::unbounded_channel();
        let mut workers = WorkerPool::spawn(providers, tx);
        let plays = Rc::new(RefCell::new(Vec::new()));
        let device_progress = Rc::new(RefCell::new(None));
        let device = FakeDevice {
            plays: Rc::clone(&plays),
            progress: Rc::clone(&device_progress),
            ..FakeDevice::default()
        };
        let media = MediaController::new(Box::new(device), &mut workers);
        Rig {
            store: StateStore::new(),
            media,
            workers,
            outcomes,
            plays,
            device_progress,
        }
    }

    fn rig() -> Rig {
        rig_with(test_providers())
    }

    impl Rig {
        async fn pump(&mut self) {
            let outcome = self.outcomes.recv().await.unwrap();
            self.media
                .on_task(&mut self.store, &mut self.workers, outcome);
        }
    }

    #[tokio::test]
    async fn test_playlist_load_publishes_first_entry_without_playing() {
        let mut rig = rig();
        rig.pump().await; // playlist fetched on construction

        assert_eq!(rig.media.playlist().len(), 3);
        assert_eq!(rig.store.vehicle().current_media.title, "Track A");
        assert!(rig.plays.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_playlist_filters_entries_without_reference() {
        let entries = vec![
            PlaylistEntry {
                title: Some("Playable".into()),
                uploader: None,
                url: Some("ref-a".into()),
            },
            PlaylistEntry {
                title: Some("Unavailable".into()),
                uploader: None,
                url: None,
            },
        ];
        let mut rig = rig_with(TaskProviders {
            media: Arc::new(MockMedia::with_playlist(entries)),
            ..test_providers()
        });
        rig.pump().await;

        assert_eq!(rig.media.playlist().len(), 1);
        assert_eq!(rig.store.vehicle().current_media.title, "Playable");
        assert_eq!(rig.store.vehicle().current_media.artist, "Unknown Artist");
    }

    #[tokio::test]
    async fn test_play_pause_resolves_before_playing_then_toggles() {
        let mut rig = rig();
        rig.pump().await; // playlist

        rig.media.play_pause(&mut rig.workers);
        assert!(rig.plays.borrow().is_empty()); // nothing until resolved
        rig.pump().await; // stream result

        assert_eq!(rig.plays.borrow().as_slice(), ["http://streams.test/ref-a"]);
        assert_eq!(rig.store.vehicle().current_media.title, "ref-a title");

        // Loaded now; a second press only toggles pause.
        rig.media.play_pause(&mut rig.workers);
        assert!(rig.outcomes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_next_previous_wrap_around() {
        let mut rig = rig();
        rig.pump().await; // playlist of 3

        rig.media.next(&mut rig.workers);
        rig.pump().await;
        rig.media.next(&mut rig.workers);
        rig.pump().await;
        rig.media.next(&mut rig.workers);
        rig.pump().await;
        // Indices visited: 1, 2, 0.
        assert_eq!(
            rig.plays.borrow().as_slice(),
            [
                "http://streams.test/ref-b",
                "http://streams.test/ref-c",
                "http://streams.test/ref-a",
            ]
        );
        assert_eq!(rig.media.playlist().current_index(), 0);

        rig.media.previous(&mut rig.workers);
        rig.pump().await;
        assert_eq!(rig.media.playlist().current_index(), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_track_is_skipped() {
        let mut rig = rig_with(TaskProviders {
            media: Arc::new(MockMedia::new().stream_failing("ref-a")),
            ..test_providers()
        });
        rig.pump().await; // playlist

        rig.media.play_pause(&mut rig.workers);
        rig.pump().await; // ref-a fails -> falls through to next()
        rig.pump().await; // ref-b resolves

        assert_eq!(rig.plays.borrow().as_slice(), ["http://streams.test/ref-b"]);
        assert_eq!(rig.media.playlist().current_index(), 1);
    }

    #[tokio::test]
    async fn test_entirely_dead_playlist_stops_after_one_cycle() {
        let mut rig = rig_with(TaskProviders {
            media: Arc::new(
                MockMedia::new()
                    .stream_without_url("ref-a")
                    .stream_without_url("ref-b")
                    .stream_without_url("ref-c"),
            ),
            ..test_providers()
        });
        rig.pump().await; // playlist

        rig.media.play_pause(&mut rig.workers);
        rig.pump().await; // ref-a -> skip
        rig.pump().await; // ref-b -> skip
        rig.pump().await; // ref-c -> gives up

        assert!(rig.plays.borrow().is_empty());
        assert!(rig.outcomes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_stream_result_is_dropped() {
        let mut rig = rig();
        rig.pump().await; // playlist

        rig.media.next(&mut rig.workers); // resolves ref-b
        rig.media.next(&mut rig.workers); // resolves ref-c, ref-b now stale
        rig.pump().await; // ref-b dropped
        rig.pump().await; // ref-c played

        assert_eq!(rig.plays.borrow().as_slice(), ["http://streams.test/ref-c"]);
    }

    #[tokio::test]
    async fn test_progress_poll_publishes_while_active() {
        let mut rig = rig();
        rig.pump().await;

        // Nothing loaded yet, no publication.
        rig.media.poll_progress(&mut rig.store);
        assert_eq!(rig.store.vehicle().media_progress, MediaProgress::default());

        rig.media.play_pause(&mut rig.workers);
        rig.pump().await;
        *rig.device_progress.borrow_mut() = Some(MediaProgress {
            position_ms: 42_000,
            duration_ms: 180_000,
        });

        rig.media.poll_progress(&mut rig.store);
        assert_eq!(rig.store.vehicle().media_progress.position_ms, 42_000);
        assert_eq!(rig.store.vehicle().media_progress.duration_ms, 180_000);
    }

    #[test]
    fn test_playlist_step_wraps_both_directions() {
        let entries = vec![
            PlaylistEntry {
                title: Some("A".into()),
                uploader: None,
                url: Some("a".into()),
            },
            PlaylistEntry {
                title: Some("B".into()),
                uploader: None,
                url: Some("b".into()),
            },
            PlaylistEntry {
                title: Some("C".into()),
                uploader: None,
                url: Some("c".into()),
            },
        ];
        let mut playlist = Playlist::from_entries(entries);
        playlist.step(1);
        playlist.step(1);
        assert_eq!(playlist.current_index(), 2);
        playlist.step(1);
        assert_eq!(playlist.current_index(), 0);
        playlist.step(-1);
        assert_eq!(playlist.current_index(), 2);
    }
}
