//! Input value objects (scenes, tracks) and the spatial-temporal pairing between them.

mod flight_track;
mod geo_time_matcher;
mod scene;


pub use flight_track::{FlightTrack, TrackSample};
pub use geo_time_matcher::{GeoTimeMatcher, MatchError, SceneMatch};
pub use scene::{BandStack, DataError, SatelliteScene};
