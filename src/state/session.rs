/// Viewer session: everything the UI shows that is not layout.
///
/// Owns the single "currently loaded track" and only changes it at four
/// points: load start, load success, load failure and selection change.
/// Every asynchronous load is tagged with a [`Ticket`]; responses carrying
/// an older ticket than the latest one issued are dropped.

use std::fmt;

use super::data::{Identifier, RunSummary, Track, TrackList};
use crate::api::{FetchError, SampleStride};
use crate::ui::render;

/// Tag attached to an in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Issues tickets and remembers which one is current
#[derive(Debug, Default)]
struct Latest {
    issued: u64,
}

impl Latest {
    fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Make every outstanding ticket stale
    fn invalidate(&mut self) {
        self.issued += 1;
    }
}

/// Entry of the run selector
#[derive(Debug, Clone, PartialEq)]
pub struct RunOption {
    pub id: Identifier,
    pub label: String,
}

impl fmt::Display for RunOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl From<&RunSummary> for RunOption {
    fn from(run: &RunSummary) -> Self {
        RunOption {
            id: run.run_ix.clone(),
            label: run.label(),
        }
    }
}

/// What to fetch for a track load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub ticket: Ticket,
    pub run: Identifier,
    pub track: Identifier,
    pub sample: SampleStride,
}

/// What to fetch for a track listing
#[derive(Debug, Clone, PartialEq)]
pub struct TracksRequest {
    pub ticket: Ticket,
    pub run: Identifier,
}

#[derive(Debug, Default)]
pub struct Session {
    runs: Vec<RunOption>,
    selected_run: Option<Identifier>,
    tracks: Vec<Identifier>,
    selected_track: Option<Identifier>,
    sample_input: String,
    track: Option<Track>,
    frame_index: usize,
    status: String,
    info: String,
    track_requests: Latest,
    list_requests: Latest,
}

impl Session {
    pub fn new(sample: SampleStride) -> Self {
        Session {
            sample_input: sample.to_string(),
            ..Session::default()
        }
    }

    pub fn runs(&self) -> &[RunOption] {
        &self.runs
    }

    pub fn selected_run(&self) -> Option<&RunOption> {
        let selected = self.selected_run.as_ref()?;
        self.runs.iter().find(|run| &run.id == selected)
    }

    pub fn tracks(&self) -> &[Identifier] {
        &self.tracks
    }

    pub fn selected_track(&self) -> Option<&Identifier> {
        self.selected_track.as_ref()
    }

    pub fn sample_input(&self) -> &str {
        &self.sample_input
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Last valid scrub position
    pub fn scrub_max(&self) -> usize {
        self.track
            .as_ref()
            .map_or(0, |track| track.points.len().saturating_sub(1))
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn runs_loading(&mut self) {
        self.status = "Loading runs…".to_string();
    }

    /// Apply the run listing. Selects the first run and asks for its tracks.
    pub fn runs_loaded(&mut self, result: Result<Vec<RunSummary>, FetchError>) -> Option<TracksRequest> {
        match result {
            Ok(runs) if runs.is_empty() => {
                self.runs.clear();
                self.tracks.clear();
                self.selected_run = None;
                self.selected_track = None;
                self.status = "No runs found".to_string();
                None
            }
            Ok(runs) => {
                tracing::info!(count = runs.len(), "runs loaded");
                self.runs = runs.iter().map(RunOption::from).collect();
                let first = self.runs[0].id.clone();
                Some(self.select_run(first))
            }
            Err(err) => {
                tracing::warn!(%err, "failed to load runs");
                self.runs.clear();
                self.tracks.clear();
                self.selected_run = None;
                self.selected_track = None;
                self.status = err.to_string();
                None
            }
        }
    }

    /// Switch runs: drops the loaded track and asks for the run's tracks
    pub fn select_run(&mut self, run: Identifier) -> TracksRequest {
        self.selected_run = Some(run.clone());
        self.tracks.clear();
        self.selected_track = None;
        self.status = "Loading tracks…".to_string();
        self.discard_track();

        TracksRequest {
            ticket: self.list_requests.issue(),
            run,
        }
    }

    /// Apply a track listing. Returns `false` when the response is stale.
    pub fn tracks_loaded(&mut self, ticket: Ticket, result: Result<TrackList, FetchError>) -> bool {
        if !self.list_requests.is_current(ticket) {
            tracing::debug!(?ticket, "dropping stale track listing");
            return false;
        }

        match result {
            Ok(list) if list.track_ixs.is_empty() => {
                self.status = "No tracks in run".to_string();
            }
            Ok(list) => {
                self.selected_track = list.track_ixs.first().cloned();
                self.tracks = list.track_ixs;
                self.status.clear();
            }
            Err(err) => {
                tracing::warn!(%err, "failed to load tracks");
                self.status = err.to_string();
            }
        }
        true
    }

    pub fn select_track(&mut self, track: Identifier) {
        if self.selected_track.as_ref() != Some(&track) {
            self.selected_track = Some(track);
            self.discard_track();
        }
    }

    pub fn set_sample_input(&mut self, text: String) {
        self.sample_input = text;
    }

    /// Start loading the selected track, or explain what is missing
    pub fn begin_load(&mut self) -> Option<LoadRequest> {
        let Some(run) = self.selected_run.clone() else {
            self.status = "Pick a run".to_string();
            return None;
        };
        let Some(track) = self.selected_track.clone() else {
            self.status = "Pick a track".to_string();
            return None;
        };

        self.status = "Loading track…".to_string();
        Some(LoadRequest {
            ticket: self.track_requests.issue(),
            run,
            track,
            sample: SampleStride::parse(&self.sample_input),
        })
    }

    /// Apply a track load. Returns `false` when the response is stale.
    pub fn finish_load(&mut self, ticket: Ticket, result: Result<Track, FetchError>) -> bool {
        if !self.track_requests.is_current(ticket) {
            tracing::debug!(?ticket, "dropping stale track response");
            return false;
        }

        match result {
            Ok(track) => {
                self.status = if track.points.is_empty() {
                    "Track has no points".to_string()
                } else {
                    format!("Loaded {} points", track.points.len())
                };
                tracing::info!(
                    run = %track.run_ix,
                    track = %track.track_ix,
                    points = track.points.len(),
                    "track loaded"
                );
                self.track = Some(track);
                self.frame_index = 0;
                self.refresh_info();
            }
            Err(err) => {
                tracing::warn!(%err, "failed to load track");
                self.track = None;
                self.frame_index = 0;
                self.info.clear();
                self.status = err.to_string();
            }
        }
        true
    }

    /// Move the scrub position, clamped to the loaded points
    pub fn scrub_to(&mut self, index: usize) {
        self.frame_index = index.min(self.scrub_max());
        self.refresh_info();
    }

    /// Move the scrub position by `delta` frames
    pub fn step(&mut self, delta: i32) {
        let target = if delta < 0 {
            self.frame_index.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            self.frame_index.saturating_add(delta as usize)
        };
        self.scrub_to(target);
    }

    fn refresh_info(&mut self) {
        if let Some(info) = render::selection_info(self.track.as_ref(), self.frame_index) {
            self.info = info;
        }
    }

    /// Forget the loaded track and anything still loading for it
    fn discard_track(&mut self) {
        self.track = None;
        self.frame_index = 0;
        self.info.clear();
        self.track_requests.invalidate();
    }
}
