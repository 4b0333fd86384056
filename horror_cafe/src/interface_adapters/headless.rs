// In-memory implementations of the engine ports. They back the headless host
// and the tests: visibility, colours and transforms are recorded, collisions
// are brute-force sphere checks.

use crate::domain::math::{Transform, Vec3, delta_angle, forward_from_angles};
use crate::domain::ports::{
    AudioSink, AudioTrack, CameraRig, Collider, Color, ObjectId, Physics, RaycastHit, SceneGraph,
    SoundId, Tag,
};
use crate::use_cases::types::{CafeLayout, CupLayout};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

const DEFAULT_RADIUS: f32 = 0.15;
// Place spots sit inside whatever is put on them, so they must stay smaller
// than a cup for the cup to be the first thing a ray hits.
const PLACE_RADIUS: f32 = 0.04;

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub tag: Tag,
    pub transform: Transform,
    pub visible: bool,
    pub color: Option<Color>,
    pub interactable: bool,
    /// Bounding-sphere radius used for ray and overlap queries.
    pub radius: f32,
}

#[derive(Default)]
pub struct HeadlessWorld {
    objects: RefCell<BTreeMap<ObjectId, SceneObject>>,
    next_id: Cell<u32>,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&self, name: &str, tag: Tag, position: Vec3) -> ObjectId {
        self.spawn_with_radius(name, tag, position, DEFAULT_RADIUS)
    }

    pub fn spawn_with_radius(&self, name: &str, tag: Tag, position: Vec3, radius: f32) -> ObjectId {
        let id = ObjectId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        self.objects.borrow_mut().insert(
            id,
            SceneObject {
                name: name.to_string(),
                tag,
                transform: Transform::at(position),
                visible: true,
                color: None,
                interactable: tag != Tag::Untagged,
                radius,
            },
        );
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<SceneObject> {
        self.objects.borrow().get(&id).cloned()
    }

    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .borrow()
            .iter()
            .find(|(_, o)| o.name == name)
            .map(|(id, _)| *id)
    }

    pub fn is_visible(&self, id: ObjectId) -> bool {
        self.objects.borrow().get(&id).is_some_and(|o| o.visible)
    }

    pub fn color(&self, id: ObjectId) -> Option<Color> {
        self.objects.borrow().get(&id).and_then(|o| o.color)
    }

    pub fn position(&self, id: ObjectId) -> Option<Vec3> {
        self.objects.borrow().get(&id).map(|o| o.transform.position)
    }

    pub fn is_interactable(&self, id: ObjectId) -> bool {
        self.objects.borrow().get(&id).is_some_and(|o| o.interactable)
    }

    pub fn move_to(&self, id: ObjectId, position: Vec3) {
        if let Some(object) = self.objects.borrow_mut().get_mut(&id) {
            object.transform.position = position;
        }
    }
}

impl SceneGraph for HeadlessWorld {
    fn set_visible(&self, object: ObjectId, visible: bool) {
        if let Some(o) = self.objects.borrow_mut().get_mut(&object) {
            o.visible = visible;
        }
    }

    fn set_color(&self, object: ObjectId, color: Color) {
        if let Some(o) = self.objects.borrow_mut().get_mut(&object) {
            o.color = Some(color);
        }
    }

    fn set_transform(&self, object: ObjectId, transform: Transform) {
        if let Some(o) = self.objects.borrow_mut().get_mut(&object) {
            o.transform = transform;
        }
    }

    fn transform(&self, object: ObjectId) -> Option<Transform> {
        self.objects.borrow().get(&object).map(|o| o.transform)
    }

    fn set_interactable(&self, object: ObjectId, interactable: bool) {
        if let Some(o) = self.objects.borrow_mut().get_mut(&object) {
            o.interactable = interactable;
        }
    }
}

impl Physics for HeadlessWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let dir = direction.normalized();
        let objects = self.objects.borrow();
        objects
            .iter()
            .filter(|(_, o)| o.interactable && o.visible && o.tag != Tag::Untagged)
            .filter_map(|(id, o)| {
                // Closest approach of the ray to the sphere centre.
                let to_center = o.transform.position - origin;
                let along = to_center.dot(dir);
                if along < 0.0 {
                    return None;
                }
                let closest = origin + dir * along;
                let miss_sq = (o.transform.position - closest).dot(o.transform.position - closest);
                let radius_sq = o.radius * o.radius;
                if miss_sq > radius_sq {
                    return None;
                }
                let distance = (along - (radius_sq - miss_sq).sqrt()).max(0.0);
                (distance <= max_distance).then_some(RaycastHit {
                    object: *id,
                    tag: o.tag,
                    point: origin + dir * distance,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Collider> {
        self.objects
            .borrow()
            .iter()
            .filter(|(_, o)| o.interactable && o.tag != Tag::Untagged)
            .filter(|(_, o)| o.transform.position.distance(center) <= radius + o.radius)
            .map(|(id, o)| Collider {
                object: *id,
                tag: o.tag,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct CameraPose {
    position: Vec3,
    yaw: f32,
    pitch: f32,
}

/// Camera moved by scripts rather than by a mouse.
pub struct ScriptedCamera {
    pose: RefCell<CameraPose>,
}

impl ScriptedCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            pose: RefCell::new(CameraPose {
                position,
                yaw: 0.0,
                pitch: 0.0,
            }),
        }
    }

    pub fn set_yaw(&self, yaw: f32) {
        self.pose.borrow_mut().yaw = yaw.rem_euclid(360.0);
    }

    pub fn turn(&self, degrees: f32) {
        let yaw = self.pose.borrow().yaw;
        self.set_yaw(yaw + degrees);
    }

    pub fn set_position(&self, position: Vec3) {
        self.pose.borrow_mut().position = position;
    }

    /// Points the camera at `target`, keeping pitch within +-90 degrees.
    pub fn look_at(&self, target: Vec3) {
        let mut pose = self.pose.borrow_mut();
        let dir = (target - pose.position).normalized();
        if dir == Vec3::ZERO {
            return;
        }
        pose.yaw = dir.x.atan2(dir.z).to_degrees().rem_euclid(360.0);
        pose.pitch = (-dir.y).asin().to_degrees().clamp(-90.0, 90.0);
    }

    /// Yaw change needed to face `target`, without moving the camera.
    pub fn yaw_towards(&self, target: Vec3) -> f32 {
        let pose = self.pose.borrow();
        let dir = target - pose.position;
        delta_angle(pose.yaw, dir.x.atan2(dir.z).to_degrees())
    }
}

impl CameraRig for ScriptedCamera {
    fn yaw_degrees(&self) -> f32 {
        self.pose.borrow().yaw
    }

    fn position(&self) -> Vec3 {
        self.pose.borrow().position
    }

    fn forward(&self) -> Vec3 {
        let pose = self.pose.borrow();
        forward_from_angles(pose.yaw, pose.pitch)
    }
}

/// Audio sink that only remembers what it was asked to do.
#[derive(Default)]
pub struct RecordingAudio {
    played: RefCell<Vec<SoundId>>,
    stopped: RefCell<Vec<SoundId>>,
    volumes: RefCell<HashMap<AudioTrack, f32>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<SoundId> {
        self.played.borrow().clone()
    }

    pub fn play_count(&self, sound: SoundId) -> usize {
        self.played.borrow().iter().filter(|s| **s == sound).count()
    }

    pub fn stopped(&self) -> Vec<SoundId> {
        self.stopped.borrow().clone()
    }

    pub fn volume(&self, track: AudioTrack) -> Option<f32> {
        self.volumes.borrow().get(&track).copied()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&self, sound: SoundId) {
        self.played.borrow_mut().push(sound);
    }

    fn stop(&self, sound: SoundId) {
        self.stopped.borrow_mut().push(sound);
    }

    fn set_volume(&self, track: AudioTrack, volume: f32) {
        self.volumes.borrow_mut().insert(track, volume);
    }
}

/// Audio sink for the headless host: every request becomes a trace event.
pub struct TracingAudio;

impl AudioSink for TracingAudio {
    fn play(&self, sound: SoundId) {
        tracing::trace!(?sound, "play");
    }

    fn stop(&self, sound: SoundId) {
        tracing::trace!(?sound, "stop");
    }

    fn set_volume(&self, track: AudioTrack, volume: f32) {
        tracing::trace!(?track, volume, "volume");
    }
}

/// Camera height used by the standard cafe.
pub const EYE_POSITION: Vec3 = Vec3::new(0.0, 1.6, 0.0);

/// Lays out the counter, machine, guests and hidden scare props.
///
/// The player stands at the origin facing +Z towards the counter; the dining
/// room is further along +Z and the back room is behind the player.
pub fn furnish_standard_cafe(world: &HeadlessWorld) -> CafeLayout {
    let lights = (0..6)
        .map(|i| {
            let x = -2.5 + i as f32;
            world.spawn(&format!("light-{i}"), Tag::Untagged, Vec3::new(x, 3.0, 2.0))
        })
        .collect();

    let cups = (0..2)
        .map(|i| {
            let position = Vec3::new(-0.6 - 0.2 * i as f32, 1.0, 1.0);
            let cup = world.spawn_with_radius(&format!("cup-{i}"), Tag::Glass, position, 0.05);
            let coffee = world.spawn(&format!("coffee-{i}"), Tag::Untagged, position);
            world.set_visible(coffee, false);
            CupLayout {
                cup,
                coffee,
                snap_offset: Vec3::new(0.0, 0.12, 0.0),
            }
        })
        .collect();

    let caps = vec![world.spawn_with_radius("cap-0", Tag::Cap, Vec3::new(-0.3, 1.0, 1.0), 0.05)];

    let normal_guests: Vec<ObjectId> = (0..3)
        .map(|i| {
            let x = -1.0 + i as f32;
            world.spawn(&format!("guest-{i}"), Tag::Untagged, Vec3::new(x, 1.0, 5.0))
        })
        .collect();
    let scary_guests: Vec<ObjectId> = (0..3)
        .map(|i| {
            let x = -1.0 + i as f32;
            let id = world.spawn(&format!("monster-{i}"), Tag::Untagged, Vec3::new(x, 1.0, 5.0));
            world.set_visible(id, false);
            id
        })
        .collect();

    let lurker = world.spawn("lurker", Tag::Untagged, Vec3::new(0.0, 1.0, -2.0));
    let apparition = world.spawn("apparition", Tag::Untagged, Vec3::new(0.0, 1.0, -2.0));
    let thing = world.spawn("thing", Tag::Untagged, Vec3::new(0.5, 1.0, -3.0));
    for hidden in [lurker, apparition, thing] {
        world.set_visible(hidden, false);
    }

    CafeLayout {
        lights,
        light_switch: world.spawn("light-switch", Tag::LightSwitch, Vec3::new(1.2, 1.5, 0.5)),
        machine_lamp: world.spawn("machine-lamp", Tag::Untagged, Vec3::new(0.3, 1.4, 1.2)),
        coffee_button: world.spawn("coffee-button", Tag::StartCoffeeButton, Vec3::new(0.3, 1.2, 1.2)),
        cup_slot: world.spawn_with_radius("cup-slot", Tag::Place, Vec3::new(0.0, 1.0, 1.2), PLACE_RADIUS),
        counter_spots: vec![world.spawn_with_radius(
            "counter",
            Tag::Place,
            Vec3::new(0.7, 1.0, 1.0),
            PLACE_RADIUS,
        )],
        client: world.spawn("client", Tag::Client, Vec3::new(0.0, 1.2, 3.5)),
        cups,
        caps,
        normal_guests,
        scary_guests,
        lurker,
        apparition,
        thing,
    }
}
