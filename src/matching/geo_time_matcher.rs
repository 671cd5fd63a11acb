use super::{DataError, FlightTrack, SatelliteScene};
use crate::event;
use chrono::TimeDelta;
use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

/// Errors raised while pairing scenes with flight tracks.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    /// No track qualified for the named scene. Recoverable: the caller may continue flight-less.
    NoMatch(String),
    /// A scene failed validation.
    InvalidScene(String, DataError),
    /// A track failed validation.
    InvalidTrack(String, DataError),
}

impl Display for MatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::NoMatch(scene) => write!(f, "no flight track matches scene {scene}"),
            MatchError::InvalidScene(scene, e) => write!(f, "scene {scene} is invalid: {e}"),
            MatchError::InvalidTrack(callsign, e) => write!(f, "track {callsign} is invalid: {e}"),
        }
    }
}

impl std::error::Error for MatchError {}

/// One qualifying scene/track pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMatch {
    /// Identifier of the matched scene.
    scene_id: String,
    /// Index of the matched track in the slice handed to the matcher.
    track_index: usize,
    /// Callsign of the matched track.
    callsign: String,
    /// Absolute offset between scene capture and the closest track sample.
    time_offset: TimeDelta,
    /// Fraction of the track footprint inside the scene footprint.
    overlap_ratio: f64,
    /// Great-circle distance between both footprint centres, in km.
    center_distance_km: f64,
}

impl SceneMatch {
    pub fn scene_id(&self) -> &str { &self.scene_id }
    pub fn track_index(&self) -> usize { self.track_index }
    pub fn callsign(&self) -> &str { &self.callsign }
    pub fn time_offset(&self) -> TimeDelta { self.time_offset }
    pub fn overlap_ratio(&self) -> f64 { self.overlap_ratio }
    pub fn center_distance_km(&self) -> f64 { self.center_distance_km }

    /// Deterministic ranking: smaller time offset, then closer footprints, then callsign.
    pub fn rank(&self, other: &Self) -> Ordering {
        self.time_offset
            .cmp(&other.time_offset)
            .then_with(|| self.center_distance_km.total_cmp(&other.center_distance_km))
            .then_with(|| self.callsign.cmp(&other.callsign))
    }
}

/// Pairs satellite scenes with flight tracks by footprint intersection and capture time.
///
/// The matcher is a pure function of its inputs and may be shared freely.
#[derive(Debug, Clone, Copy)]
pub struct GeoTimeMatcher {
    /// Maximum accepted offset between capture time and closest track sample.
    tolerance: TimeDelta,
}

impl GeoTimeMatcher {
    pub fn new(tolerance: TimeDelta) -> Self { Self { tolerance } }

    pub fn tolerance(&self) -> TimeDelta { self.tolerance }

    /// Finds every track whose footprint intersects the scene footprint and whose closest
    /// sample lies within the time tolerance of the capture time.
    ///
    /// # Arguments
    /// * `scene` - The scene to match against.
    /// * `tracks` - Candidate tracks.
    ///
    /// # Returns
    /// The qualifying pairs, best first (see [`SceneMatch::rank`]).
    ///
    /// # Errors
    /// [`MatchError::NoMatch`] if no track qualifies, or a validation error for malformed input.
    pub fn match_tracks(
        &self,
        scene: &SatelliteScene,
        tracks: &[FlightTrack],
    ) -> Result<Vec<SceneMatch>, MatchError> {
        scene.validate().map_err(|e| MatchError::InvalidScene(scene.id().to_string(), e))?;
        let scene_box = scene.footprint();
        let mut matches = Vec::new();

        for (track_index, track) in tracks.iter().enumerate() {
            track
                .validate()
                .map_err(|e| MatchError::InvalidTrack(track.callsign().to_string(), e))?;
            let Some(track_box) = track.footprint() else { continue };
            if !track_box.intersects(scene_box) {
                continue;
            }
            let Some(time_offset) = track.closest_time_offset(scene.captured_at()) else {
                continue;
            };
            if time_offset > self.tolerance {
                event!(
                    "Track {} intersects scene {} but is {}s off",
                    track.callsign(),
                    scene.id(),
                    time_offset.num_seconds()
                );
                continue;
            }
            matches.push(SceneMatch {
                scene_id: scene.id().to_string(),
                track_index,
                callsign: track.callsign().to_string(),
                time_offset,
                overlap_ratio: track_box.overlap_ratio(scene_box),
                center_distance_km: track_box.center().haversine_km(&scene_box.center()),
            });
        }

        if matches.is_empty() {
            return Err(MatchError::NoMatch(scene.id().to_string()));
        }
        matches.sort_by(SceneMatch::rank);
        Ok(matches)
    }

    /// Finds the best scene for a single track among several candidate scenes.
    ///
    /// # Returns
    /// The index of the chosen scene in `scenes` together with its match.
    ///
    /// # Errors
    /// [`MatchError::NoMatch`] naming the first scene (or `"<none>"`) if no scene qualifies;
    /// validation errors are propagated immediately.
    pub fn best_scene_for<'a>(
        &self,
        scenes: impl IntoIterator<Item = &'a SatelliteScene>,
        track: &FlightTrack,
    ) -> Result<(usize, SceneMatch), MatchError> {
        let mut best: Option<(usize, SceneMatch)> = None;
        let mut first_id = None;
        for (scene_index, scene) in scenes.into_iter().enumerate() {
            first_id.get_or_insert_with(|| scene.id().to_string());
            let found = match self.match_tracks(scene, std::slice::from_ref(track)) {
                Ok(mut m) => m.swap_remove(0),
                Err(MatchError::NoMatch(_)) => continue,
                Err(e) => return Err(e),
            };
            let better = best.as_ref().is_none_or(|(_, current)| found.rank(current).is_lt());
            if better {
                best = Some((scene_index, found));
            }
        }
        best.ok_or_else(|| MatchError::NoMatch(first_id.unwrap_or_else(|| String::from("<none>"))))
    }
}
