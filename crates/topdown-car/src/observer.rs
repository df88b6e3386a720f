//! Pose observers and the body-to-observer mapping.

use std::sync::{Arc, Mutex};

use glam::Vec2;

use crate::world::{BodyHandle, RigidBodyWorld};

/// Receives a body's pose after every simulation step.
///
/// Typically a rendering proxy. Closures taking `(position, angle)` implement
/// this trait directly.
pub trait PoseObserver: Send {
    /// Called once per tick with the body's world center and angle.
    fn on_pose_update(&mut self, position: Vec2, angle: f32);

    /// Called when the body is removed from the world.
    fn on_removed(&mut self) {}
}

impl<F> PoseObserver for F
where
    F: FnMut(Vec2, f32) + Send,
{
    fn on_pose_update(&mut self, position: Vec2, angle: f32) {
        self(position, angle);
    }
}

/// One pose report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub angle: f32,
}

#[derive(Debug, Default)]
struct RecorderLog {
    poses: Vec<Pose>,
    removed: bool,
}

/// Observer that records every report into a shared buffer.
///
/// Clones share the same buffer, so one clone can be handed to the
/// simulation while another is kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct PoseRecorder {
    log: Arc<Mutex<RecorderLog>>,
}

impl PoseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All poses recorded so far.
    pub fn poses(&self) -> Vec<Pose> {
        self.log
            .lock()
            .map(|log| log.poses.clone())
            .unwrap_or_default()
    }

    /// The most recent pose, if any.
    pub fn last(&self) -> Option<Pose> {
        self.log.lock().ok().and_then(|log| log.poses.last().copied())
    }

    /// Number of pose reports received.
    pub fn len(&self) -> usize {
        self.log.lock().map(|log| log.poses.len()).unwrap_or(0)
    }

    /// Whether no pose was reported yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `on_removed` was called.
    pub fn was_removed(&self) -> bool {
        self.log.lock().map(|log| log.removed).unwrap_or(false)
    }
}

impl PoseObserver for PoseRecorder {
    fn on_pose_update(&mut self, position: Vec2, angle: f32) {
        if let Ok(mut log) = self.log.lock() {
            log.poses.push(Pose { position, angle });
        }
    }

    fn on_removed(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.removed = true;
        }
    }
}

/// Explicit mapping from bodies to the observers that mirror them.
#[derive(Default)]
pub struct PoseRegistry {
    entries: Vec<(BodyHandle, Box<dyn PoseObserver>)>,
}

impl PoseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `observer` with `body`.
    pub fn insert(&mut self, body: BodyHandle, observer: Box<dyn PoseObserver>) {
        self.entries.push((body, observer));
    }

    /// Number of tagged bodies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read every tagged body's pose from `world` and forward it.
    pub fn publish(&mut self, world: &impl RigidBodyWorld) {
        for (body, observer) in &mut self.entries {
            observer.on_pose_update(world.world_center(*body), world.angle(*body));
        }
    }

    /// Notify every observer that its body is gone and drop the mapping.
    pub fn remove_all(&mut self) {
        for (_, mut observer) in self.entries.drain(..) {
            observer.on_removed();
        }
    }
}
