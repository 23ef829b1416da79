//! Encoder Driver: the single worker that turns `QUEUED` entries into
//! `DONE` (or `OPTIMUM`) ones, one at a time, on its own OS thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spacesaver_av::{encoder, skip};
use spacesaver_common::EntryId;
use spacesaver_db::{Entry, ProgressUpdate, Status, Store};

use crate::config::Config;
use crate::prober;

const IDLE_SLEEP: Duration = Duration::from_secs(5);
const IDLE_SLEEP_STEP: Duration = Duration::from_millis(100);

/// Snapshot of the currently-processed entry, for the Control Surface's
/// `/status` handler. The `Progress` row in the Store remains the single
/// source of truth; this is a read-only cache for display.
#[derive(Debug, Clone, Default)]
pub struct DriverState {
    pub current_entry: Option<Entry>,
    pub frame_current: u64,
    pub frame_total: u64,
    pub progress: f64,
}

/// The encoder worker. Owns no policy of its own beyond "process whatever
/// `pick_next_queued` returns next" — admission decides what gets queued.
pub struct EncoderDriver {
    store: Store,
    config: Config,
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<DriverState>>,
}

impl EncoderDriver {
    #[must_use]
    pub fn new(store: Store, config: Config, stop: Arc<AtomicBool>) -> Self {
        Self {
            store,
            config,
            stop,
            state: Arc::new(Mutex::new(DriverState::default())),
        }
    }

    /// Shared handle the Control Surface reads for `/status`.
    #[must_use]
    pub fn state_handle(&self) -> Arc<Mutex<DriverState>> {
        Arc::clone(&self.state)
    }

    /// Run the startup hook, then the main loop, until the stop flag is set.
    pub fn run(&self) {
        self.startup();

        while !self.stop.load(Ordering::Relaxed) {
            match self.store.pick_next_queued() {
                Ok(Some(entry)) => self.process(entry),
                Ok(None) => self.idle_sleep(),
                Err(e) => {
                    tracing::warn!(event = "driver_loop_error", error = %e, "failed to poll queue, backing off");
                    self.idle_sleep();
                }
            }
        }
    }

    /// Workdir setup, leftover workfile cleanup, and crash recovery. Exposed
    /// so tests can exercise recovery without running the full loop.
    pub fn startup(&self) {
        if let Err(e) = std::fs::create_dir_all(&self.config.workdir) {
            tracing::warn!(event = "driver_workdir_unwritable", workdir = %self.config.workdir, error = %e, "workdir not writable");
        }

        if let Ok(read_dir) = std::fs::read_dir(&self.config.workdir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("mkv") {
                    if let Err(e) = std::fs::remove_file(&path) {
                        tracing::warn!(event = "driver_cleanup_failed", path = %path.display(), error = %e, "failed to remove leftover workfile");
                    }
                }
            }
        }

        if let Err(e) = self.store.reset_in_progress_to_pending() {
            tracing::warn!(event = "driver_reset_failed", error = %e, "failed to reset in-progress rows at startup");
        }
    }

    /// Cancellable sleep between empty polls of the queue. Exposed so tests
    /// can verify it returns promptly once `stop` is set.
    pub fn idle_sleep(&self) {
        let mut waited = Duration::ZERO;
        while waited < IDLE_SLEEP {
            if self.stop.load(Ordering::Relaxed) {
                return;
            }
            std::thread::sleep(IDLE_SLEEP_STEP);
            waited += IDLE_SLEEP_STEP;
        }
    }

    /// Run one entry through the full pipeline: probe, skip oracle, encode,
    /// and the success/failure status transition. Exposed so tests can drive
    /// a single entry synchronously instead of running the polling loop.
    pub fn process(&self, entry: Entry) {
        {
            let mut state = self.state.lock().expect("driver state mutex poisoned");
            *state = DriverState { current_entry: Some(entry.clone()), ..Default::default() };
        }

        let outcome = self.process_inner(&entry);

        {
            let mut state = self.state.lock().expect("driver state mutex poisoned");
            *state = DriverState::default();
        }

        if let Err(e) = outcome {
            tracing::warn!(event = "encode_failed", uuid = %entry.uuid, error = %e, "encode failed");
        }
    }

    fn process_inner(&self, entry: &Entry) -> anyhow::Result<()> {
        let path = std::path::Path::new(&entry.path);

        let probe = match prober::probe_fresh(path, &self.config) {
            Ok(p) if !p.video_streams.is_empty() => p,
            Ok(_) => {
                tracing::warn!(event = "encode_no_video_streams", uuid = %entry.uuid, "fresh probe found no video streams, reverting to pending");
                self.store.set_status(entry.uuid, Status::Pending)?;
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(event = "encode_probe_failed", uuid = %entry.uuid, error = %e, "fresh probe failed, reverting to pending");
                self.store.set_status(entry.uuid, Status::Pending)?;
                return Ok(());
            }
        };

        if let Some(reason) = skip::should_skip(&probe, self.config.crf, self.config.res_cap) {
            tracing::info!(event = "encode_skipped", uuid = %entry.uuid, reason, "skip oracle: skipping encode");
            self.store.update_progress(
                entry.uuid,
                &ProgressUpdate { status: Some(Status::Optimum), progress: Some(100.0), ..Default::default() },
            )?;
            return Ok(());
        }

        let workfile = std::path::PathBuf::from(&self.config.workdir).join(format!("{}.mkv", entry.uuid));
        self.store.update_progress(
            entry.uuid,
            &ProgressUpdate {
                status: Some(Status::InProgress),
                progress: Some(0.0),
                workfile: Some(Some(workfile.display().to_string())),
                ..Default::default()
            },
        )?;

        let frame_total = encoder::estimate_frame_total(&probe);
        self.store.update_progress(
            entry.uuid,
            &ProgressUpdate { frame_total: Some(frame_total as i64), ..Default::default() },
        )?;
        {
            let mut state = self.state.lock().expect("driver state mutex poisoned");
            state.frame_total = frame_total;
        }

        let args = encoder::build_args(path, &workfile, &probe, self.config.crf, self.config.res_cap);
        let ffmpeg_bin = std::path::Path::new(&self.config.ffmpeg_path);

        let mut last_logged_pct = -1i64;
        let result = encoder::run_encode(ffmpeg_bin, &args, |frame_current| {
            self.on_progress(entry.uuid, frame_current, frame_total, &mut last_logged_pct);
        });

        match result {
            Ok(_) => self.finish_success(entry, &workfile),
            Err(e) => {
                let _ = std::fs::remove_file(&workfile);
                self.store.update_progress(
                    entry.uuid,
                    &ProgressUpdate {
                        status: Some(Status::Pending),
                        progress: Some(0.0),
                        workfile: Some(None),
                        ..Default::default()
                    },
                )?;
                Err(anyhow::anyhow!("encode failed for {}: {e}", entry.uuid))
            }
        }
    }

    fn on_progress(&self, uuid: EntryId, frame_current: u64, frame_total: u64, last_logged_pct: &mut i64) {
        let progress = if frame_total > 0 {
            (100.0 * frame_current as f64 / frame_total as f64).min(99.0)
        } else {
            0.0
        };

        let _ = self.store.update_progress(
            uuid,
            &ProgressUpdate { progress: Some(progress), frame_current: Some(frame_current as i64), ..Default::default() },
        );
        {
            let mut state = self.state.lock().expect("driver state mutex poisoned");
            state.frame_current = frame_current;
            state.progress = progress;
        }

        let pct_bucket = (progress / 5.0) as i64;
        if pct_bucket > *last_logged_pct {
            *last_logged_pct = pct_bucket;
            tracing::info!(event = "encode_progress", uuid = %uuid, frame_current, frame_total, progress, "encode progress");
        }
    }

    fn finish_success(&self, entry: &Entry, workfile: &std::path::Path) -> anyhow::Result<()> {
        let dest_dir = std::path::Path::new(&self.config.dest_dir);
        std::fs::create_dir_all(dest_dir).ok();

        let dest = dest_dir.join(format!("{}.{}.mkv", entry.hash, entry.name));
        std::fs::rename(workfile, &dest)
            .or_else(|_| std::fs::copy(workfile, &dest).map(|_| ()).and_then(|()| std::fs::remove_file(workfile)))?;

        if let Err(e) = std::fs::remove_file(&entry.path) {
            tracing::warn!(event = "encode_source_cleanup_failed", uuid = %entry.uuid, error = %e, "failed to delete source file after encode");
        }

        self.store.update_progress(
            entry.uuid,
            &ProgressUpdate {
                status: Some(Status::Done),
                progress: Some(100.0),
                workfile: Some(None),
                ..Default::default()
            },
        )?;
        tracing::info!(event = "encode_done", uuid = %entry.uuid, dest = %dest.display(), "encode complete");
        Ok(())
    }
}

/// Read-only snapshot helper for `/status`, independent of any particular
/// driver instance (used by handlers that only hold the shared state).
#[must_use]
pub fn snapshot(state: &Arc<Mutex<DriverState>>) -> DriverState {
    state.lock().expect("driver state mutex poisoned").clone()
}

