use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fusion::detection::{Appearance, DetectedObject, ObjectClass, ObjectColor};

/// Derived motion signal: an object growing between sightings is moving
/// towards the camera, a shrinking one is moving away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Movement {
    None,
    Approaching,
    Leaving,
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Movement::None => "None",
            Movement::Approaching => "Approaching",
            Movement::Leaving => "Leaving",
        };
        write!(f, "{}", s)
    }
}

/// One object currently (or recently) visible in a single camera. Owned by
/// that camera's registry; there is at most one actor per local id at any
/// time.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedActor {
    id: u32,
    class: ObjectClass,
    color: ObjectColor,
    size: f32,
    movement: Movement,
    last_seen_step: u64,
}

impl TrackedActor {
    pub fn new(detection: &DetectedObject, current_step: u64) -> Self {
        TrackedActor {
            id: detection.get_id(),
            class: detection.get_class(),
            color: detection.get_color(),
            size: detection.get_size(),
            movement: Movement::Approaching,
            last_seen_step: current_step,
        }
    }
    /// Refreshes the actor with a new sighting of the same local id.
    /// Class and color are overwritten (the detector may re-classify),
    /// movement is derived from the size delta and a size tie keeps the
    /// previous state. Size is overwritten last.
    pub fn observe(&mut self, detection: &DetectedObject, current_step: u64) {
        self.class = detection.get_class();
        self.color = detection.get_color();
        self.last_seen_step = current_step;
        if detection.get_size() > self.size {
            self.movement = Movement::Approaching;
        } else if detection.get_size() < self.size {
            self.movement = Movement::Leaving;
        }
        self.size = detection.get_size();
    }
    pub fn get_id(&self) -> u32 {
        self.id
    }
    pub fn get_size(&self) -> f32 {
        self.size
    }
    pub fn get_movement(&self) -> Movement {
        self.movement
    }
    pub fn get_last_seen_step(&self) -> u64 {
        self.last_seen_step
    }
    /// An actor is stale once it was absent for more than `max_stale_steps`
    /// consecutive steps.
    pub fn is_stale(&self, current_step: u64, max_stale_steps: u64) -> bool {
        current_step.saturating_sub(self.last_seen_step) > max_stale_steps
    }
}

impl Appearance for TrackedActor {
    fn get_class(&self) -> ObjectClass {
        self.class
    }
    fn get_color(&self) -> ObjectColor {
        self.color
    }
}

impl fmt::Display for TrackedActor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[Id={}, Type={}, Color={}, Size={}, Dir={}, Last={}]",
            self.id, self.class, self.color, self.size, self.movement, self.last_seen_step
        )
    }
}

mod tests {
    use super::*;

    fn detection(size: f32) -> DetectedObject {
        DetectedObject::new(7, ObjectClass::Car, ObjectColor::Red, size).unwrap()
    }

    #[test]
    fn test_movement_growing_size() {
        let mut actor = TrackedActor::new(&detection(0.1), 1);
        actor.observe(&detection(0.2), 2);
        actor.observe(&detection(0.3), 3);
        assert_eq!(actor.get_movement(), Movement::Approaching);
        assert_eq!(actor.get_size(), 0.3);
        assert_eq!(actor.get_last_seen_step(), 3);
    }

    #[test]
    fn test_movement_shrinking_size() {
        let mut actor = TrackedActor::new(&detection(0.3), 1);
        actor.observe(&detection(0.2), 2);
        assert_eq!(actor.get_movement(), Movement::Leaving);
    }

    #[test]
    fn test_movement_tie_keeps_previous_state() {
        let mut actor = TrackedActor::new(&detection(0.3), 1);
        actor.observe(&detection(0.2), 2);
        actor.observe(&detection(0.2), 3);
        assert_eq!(actor.get_movement(), Movement::Leaving);
    }

    #[test]
    fn test_reclassification_overwrites_labels() {
        let mut actor = TrackedActor::new(&detection(0.1), 1);
        let truck = DetectedObject::new(7, ObjectClass::Truck, ObjectColor::Blue, 0.1).unwrap();
        actor.observe(&truck, 2);
        assert_eq!(actor.get_class(), ObjectClass::Truck);
        assert_eq!(actor.get_color(), ObjectColor::Blue);
    }

    #[test]
    fn test_staleness() {
        let actor = TrackedActor::new(&detection(0.1), 3);
        assert!(!actor.is_stale(5, 2));
        assert!(actor.is_stale(6, 2));
    }
}
