use std::collections::BTreeMap;
use std::fmt;

use crate::fusion::actor::TrackedActor;
use crate::fusion::detection::DetectedObject;

/// Max number of steps an actor survives in a registry without a sighting.
pub const MAX_STALE_STEPS: u64 = 2;

/// Per-camera registry of currently (and recently) visible objects, keyed
/// by the camera tracker's local id. A `BTreeMap` keeps iteration in
/// ascending id order, which the fusion pass relies on for determinism.
pub struct CameraRegistry {
    name: String,
    actors: BTreeMap<u32, TrackedActor>,
}

impl CameraRegistry {
    pub fn new(name: String) -> Self {
        CameraRegistry {
            name,
            actors: BTreeMap::new(),
        }
    }
    /// Ingests one step worth of detections, then evicts every actor that
    /// was absent for more than `max_stale_steps` consecutive steps. An
    /// empty slice is valid ("zero detections this step") and only
    /// triggers the eviction pass.
    pub fn update(
        &mut self,
        detections: &[DetectedObject],
        current_step: u64,
        max_stale_steps: u64,
    ) {
        for detection in detections {
            match self.actors.get_mut(&detection.get_id()) {
                Some(actor) => {
                    actor.observe(detection, current_step);
                }
                None => {
                    self.actors
                        .insert(detection.get_id(), TrackedActor::new(detection, current_step));
                }
            }
        }
        // Clean up actors the camera tracker stopped reporting
        self.actors.retain(|_, actor| {
            let delete = actor.is_stale(current_step, max_stale_steps);
            !delete // <- if we want to keep actor closure should return true
        });
    }
    pub fn get_name(&self) -> &str {
        &self.name
    }
    pub fn actor(&self, local_id: u32) -> Option<&TrackedActor> {
        self.actors.get(&local_id)
    }
    pub fn actors(&self) -> &BTreeMap<u32, TrackedActor> {
        &self.actors
    }
    pub fn len(&self) -> usize {
        self.actors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl fmt::Display for CameraRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for actor in self.actors.values() {
            write!(f, "{} - ", actor)?;
        }
        Ok(())
    }
}

mod tests {
    use super::*;
    use crate::fusion::detection::{ObjectClass, ObjectColor};
    use crate::fusion::Movement;

    fn car(id: u32, size: f32) -> DetectedObject {
        DetectedObject::new(id, ObjectClass::Car, ObjectColor::Red, size).unwrap()
    }

    #[test]
    fn test_ingest_and_refresh() {
        let mut registry = CameraRegistry::new("CAM-1".to_string());
        registry.update(&[car(5, 0.1)], 1, MAX_STALE_STEPS);
        assert_eq!(registry.len(), 1);

        registry.update(&[car(5, 0.2)], 2, MAX_STALE_STEPS);
        assert_eq!(registry.len(), 1);
        let actor = registry.actor(5).unwrap();
        assert_eq!(actor.get_movement(), Movement::Approaching);
        assert_eq!(actor.get_last_seen_step(), 2);
    }

    #[test]
    fn test_stale_eviction_boundary() {
        let mut registry = CameraRegistry::new("CAM-1".to_string());
        registry.update(&[car(5, 0.1)], 3, MAX_STALE_STEPS);

        // Absent for 2 steps: still within the retention threshold
        registry.update(&[], 5, MAX_STALE_STEPS);
        assert!(registry.actor(5).is_some());

        // Absent for 3 steps: gone
        registry.update(&[], 6, MAX_STALE_STEPS);
        assert!(registry.actor(5).is_none());
    }

    #[test]
    fn test_eviction_bound_holds_for_all_actors() {
        let mut registry = CameraRegistry::new("CAM-1".to_string());
        registry.update(&[car(1, 0.1), car(2, 0.1), car(3, 0.1)], 1, MAX_STALE_STEPS);
        registry.update(&[car(2, 0.1)], 4, MAX_STALE_STEPS);
        for actor in registry.actors().values() {
            assert!(4 - actor.get_last_seen_step() <= MAX_STALE_STEPS);
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_local_id_reuse() {
        // Camera trackers recycle local ids: a fresh sighting of a known id
        // must simply refresh the existing actor, whatever it now looks like
        let mut registry = CameraRegistry::new("CAM-1".to_string());
        registry.update(&[car(5, 0.1)], 1, MAX_STALE_STEPS);
        let person =
            DetectedObject::new(5, ObjectClass::Person, ObjectColor::Gray, 0.05).unwrap();
        registry.update(&[person], 2, MAX_STALE_STEPS);
        assert_eq!(registry.len(), 1);
        use crate::fusion::detection::Appearance;
        assert_eq!(registry.actor(5).unwrap().get_class(), ObjectClass::Person);
    }
}
