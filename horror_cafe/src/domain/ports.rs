// Ports onto the host engine. The simulation never renders, collides or plays
// audio itself; it asks these collaborators to do so.

use super::math::{Transform, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Gameplay tag attached to colliders, used to decide what an interaction means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Untagged,
    Glass,
    Place,
    Cap,
    StartCoffeeButton,
    LightSwitch,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub object: ObjectId,
    pub tag: Tag,
    pub point: Vec3,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub object: ObjectId,
    pub tag: Tag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SoundId {
    CoffeeMachine,
    CoffeeDrip,
    PaperCollect,
    CapAttach,
    Coins,
    LightSwitchOn,
    LightSwitchOff,
    GuestScream,
    ThingFromTheBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AudioTrack {
    MainTheme,
    RelaxTheme,
    CafeNoise,
}

pub trait SceneGraph {
    fn set_visible(&self, object: ObjectId, visible: bool);
    fn set_color(&self, object: ObjectId, color: Color);
    fn set_transform(&self, object: ObjectId, transform: Transform);
    fn transform(&self, object: ObjectId) -> Option<Transform>;
    /// Enables or disables the object's collider for interaction and overlap queries.
    fn set_interactable(&self, object: ObjectId, interactable: bool);
}

pub trait Physics {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit>;
    /// Interactable colliders within `radius` of `center`.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Collider>;
}

pub trait CameraRig {
    fn yaw_degrees(&self) -> f32;
    fn position(&self) -> Vec3;
    fn forward(&self) -> Vec3;
}

pub trait RandomSource {
    /// Uniform sample in `min..max`; returns `min` when the range is empty.
    fn range_f32(&self, min: f32, max: f32) -> f32;
    /// Uniform sample in `min..max_exclusive`; returns `min` when the range is empty.
    fn range_int(&self, min: i32, max_exclusive: i32) -> i32;
}

pub trait AudioSink {
    fn play(&self, sound: SoundId);
    fn stop(&self, sound: SoundId);
    fn set_volume(&self, track: AudioTrack, volume: f32);
}

/// Bundle of collaborators handed to every component.
///
/// Audio is optional; without a sink, sound requests are logged and skipped.
#[derive(Clone)]
pub struct Stage {
    pub scene: Rc<dyn SceneGraph>,
    pub physics: Rc<dyn Physics>,
    pub camera: Rc<dyn CameraRig>,
    pub random: Rc<dyn RandomSource>,
    pub audio: Option<Rc<dyn AudioSink>>,
}

impl Stage {
    pub fn play_sound(&self, sound: SoundId) {
        match &self.audio {
            Some(audio) => audio.play(sound),
            None => warn!(?sound, "no audio sink; sound skipped"),
        }
    }

    pub fn stop_sound(&self, sound: SoundId) {
        if let Some(audio) = &self.audio {
            audio.stop(sound);
        }
    }

    pub fn set_volume(&self, track: AudioTrack, volume: f32) {
        match &self.audio {
            Some(audio) => audio.set_volume(track, volume),
            None => warn!(?track, volume, "no audio sink; volume change skipped"),
        }
    }

    pub fn set_all_visible(&self, objects: &[ObjectId], visible: bool) {
        for object in objects {
            self.scene.set_visible(*object, visible);
        }
    }
}
