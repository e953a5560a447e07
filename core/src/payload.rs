use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{ArgMap, EventEnvelope};

/// Event types of the player family. Anything that moves, freezes, or
/// re-anchors the playhead is in here, which is why volume and track
/// changes are included alongside transport controls.
pub const PLAYER_EVENT_TYPES: [&str; 6] = [
    "music.MusicPlayEvent",
    "music.MusicPauseEvent",
    "music.MusicStopEvent",
    "music.SeekChangeEvent",
    "music.VolumeChangeEvent",
    "music.NewPlayingTrackEvent",
];

/// Decoded payload of a pushed event, keyed by its type string.
///
/// Unrecognized types keep their args as an open map so newer hub versions
/// can ship event types this library does not know about yet.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    MusicPlay(PlayerStatus),
    MusicPause(PlayerStatus),
    MusicStop(PlayerStatus),
    SeekChange(PlayerStatus),
    VolumeChange(PlayerStatus),
    NewPlayingTrack(PlayerStatus),
    Other(ArgMap),
}

impl EventPayload {
    /// Decode an envelope into its typed payload. Decoding is lenient: a
    /// malformed player payload degrades to an empty status rather than
    /// failing dispatch.
    pub fn decode(envelope: &EventEnvelope) -> Self {
        let status = || PlayerStatus::from_args(&envelope.args);

        match &*envelope.event_type {
            "music.MusicPlayEvent" => Self::MusicPlay(status()),
            "music.MusicPauseEvent" => Self::MusicPause(status()),
            "music.MusicStopEvent" => Self::MusicStop(status()),
            "music.SeekChangeEvent" => Self::SeekChange(status()),
            "music.VolumeChangeEvent" => Self::VolumeChange(status()),
            "music.NewPlayingTrackEvent" => Self::NewPlayingTrack(status()),
            _ => Self::Other(envelope.args.clone()),
        }
    }

    pub fn status(&self) -> Option<&PlayerStatus> {
        match self {
            Self::MusicPlay(status)
            | Self::MusicPause(status)
            | Self::MusicStop(status)
            | Self::SeekChange(status)
            | Self::VolumeChange(status)
            | Self::NewPlayingTrack(status) => Some(status),
            Self::Other(_) => None,
        }
    }
}

/// Player state snapshot embedded in every player event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    #[serde(default)]
    pub state: Option<PlayerState>,
    /// Playhead position in seconds. Seek events report it as `position`.
    #[serde(default, alias = "position")]
    pub elapsed: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub track: Option<ArgMap>,
}

impl PlayerStatus {
    fn from_args(args: &ArgMap) -> Self {
        serde_json::from_value(Value::Object(args.clone())).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Play,
    Pause,
    Stop,
}
