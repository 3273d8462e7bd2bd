use std::collections::HashSet;

use log::warn;

use crate::fusion::actor::Movement;
use crate::fusion::detection::{Appearance, ObjectClass};
use crate::fusion::group::Group;

/// Camera roles for one monitored intersection: a vehicle approaching in
/// the approach camera is dangerous whenever a person is visible in either
/// of the two crossing cameras.
#[derive(Debug, Clone)]
pub struct IntersectionRule {
    pub approach_camera: u32,
    pub crossing_cameras: [u32; 2],
}

impl IntersectionRule {
    /// Creates the default rule: camera 3 watches the approach lane and
    /// cameras 1 and 2 watch the pedestrian crossings.
    ///
    /// Basic usage:
    ///
    /// ```
    /// use fusion_rs::fusion::IntersectionRule;
    /// let rule = IntersectionRule::default();
    /// ```
    pub fn default() -> Self {
        IntersectionRule {
            approach_camera: 3,
            crossing_cameras: [1, 2],
        }
    }
    pub fn new(approach_camera: u32, crossing_cameras: [u32; 2]) -> Self {
        IntersectionRule {
            approach_camera,
            crossing_cameras,
        }
    }
}

impl Group {
    /// Evaluates the intersection rule over this step's fused identities.
    /// Dangers are fully recomputed each step; a fused identity that
    /// already contributed to a record is not reused as the non-person
    /// anchor again within the same pass, while each distinct pedestrian
    /// still produces its own record.
    pub(crate) fn identify_dangers(&mut self, rule: &IntersectionRule) {
        let mut dangers: Vec<String> = Vec::new();
        let mut treated: HashSet<u64> = HashSet::new();

        for anchor in self.fused().iter() {
            if treated.contains(&anchor.get_id()) || anchor.get_class() == ObjectClass::Person {
                continue;
            }
            let local_id = match anchor.seen_by(rule.approach_camera) {
                Some(v) => v,
                None => continue,
            };
            let actor = match self.resolve_member(rule.approach_camera, local_id) {
                Ok(v) => v,
                Err(err) => {
                    // A stale member ref is a contract violation; keep the
                    // monitoring loop alive and skip this identity
                    warn!(
                        "skipping danger evaluation for common id {}: {:?}",
                        anchor.get_id(),
                        err
                    );
                    continue;
                }
            };
            if actor.get_movement() != Movement::Approaching {
                continue;
            }

            // Vehicle closing in on the crossing: any person visible in a
            // crossing camera is in danger
            let mut emitted = false;
            for person in self.fused().iter() {
                if person.get_class() != ObjectClass::Person {
                    continue;
                }
                if rule
                    .crossing_cameras
                    .iter()
                    .any(|&camera_id| person.seen_by(camera_id).is_some())
                {
                    dangers.push(format!(
                        "DANGER: common id {} in CAM{} and common id {} in CAM{} or CAM{}",
                        anchor.get_id(),
                        rule.approach_camera,
                        person.get_id(),
                        rule.crossing_cameras[0],
                        rule.crossing_cameras[1]
                    ));
                    treated.insert(person.get_id());
                    emitted = true;
                }
            }
            if emitted {
                treated.insert(anchor.get_id());
            }
        }

        self.set_dangers(dangers);
    }
}

mod tests {
    use crate::fusion::detection::{DetectedObject, ObjectClass, ObjectColor};
    use crate::fusion::FusionEngine;

    fn car(id: u32, size: f32) -> DetectedObject {
        DetectedObject::new(id, ObjectClass::Car, ObjectColor::Red, size).unwrap()
    }

    fn person(id: u32, size: f32) -> DetectedObject {
        DetectedObject::new(id, ObjectClass::Person, ObjectColor::Gray, size).unwrap()
    }

    // A red car visible in cameras 1 and 3 (approaching in 3), a person
    // visible in cameras 1 and 2
    fn feed_dangerous_step(engine: &mut FusionEngine, size: f32) {
        engine.update_camera(1, 1, &[car(2, size), person(1, 0.05)]);
        engine.update_camera(1, 2, &[person(3, 0.04)]);
        engine.update_camera(1, 3, &[car(4, size)]);
        engine.step();
    }

    #[test]
    fn test_danger_trigger() {
        let mut engine = FusionEngine::default();
        feed_dangerous_step(&mut engine, 0.1);
        engine.identify_dangers();

        let group = engine.group(1).unwrap();
        use crate::fusion::detection::Appearance;
        let car_id = group
            .fused()
            .iter()
            .find(|identity| identity.get_class() == ObjectClass::Car)
            .unwrap()
            .get_id();
        let person_id = group
            .fused()
            .iter()
            .find(|identity| identity.get_class() == ObjectClass::Person)
            .unwrap()
            .get_id();
        assert_eq!(group.dangers().len(), 1);
        let record = &group.dangers()[0];
        assert!(record.contains(&format!("common id {} in CAM3", car_id)));
        assert!(record.contains(&format!("common id {} in CAM1 or CAM2", person_id)));
    }

    #[test]
    fn test_no_danger_when_vehicle_leaving() {
        let mut engine = FusionEngine::default();
        feed_dangerous_step(&mut engine, 0.1);
        // Shrinking vehicle: movement flips to Leaving
        feed_dangerous_step(&mut engine, 0.08);
        engine.identify_dangers();

        assert!(engine.group(1).unwrap().dangers().is_empty());
    }

    #[test]
    fn test_no_danger_without_person_on_crossing() {
        let mut engine = FusionEngine::default();
        engine.update_camera(1, 1, &[car(2, 0.1)]);
        engine.update_camera(1, 2, &[]);
        engine.update_camera(1, 3, &[car(4, 0.1)]);
        engine.step();
        engine.identify_dangers();

        assert!(engine.group(1).unwrap().dangers().is_empty());
    }

    #[test]
    fn test_each_pedestrian_reported_separately() {
        let mut engine = FusionEngine::default();
        engine.update_camera(
            1,
            1,
            &[car(2, 0.1), person(1, 0.05), person(5, 0.06)],
        );
        engine.update_camera(1, 2, &[person(3, 0.04), person(6, 0.05)]);
        engine.update_camera(1, 3, &[car(4, 0.1)]);
        engine.step();
        engine.identify_dangers();

        // One approaching vehicle against two distinct fused pedestrians
        assert_eq!(engine.group(1).unwrap().dangers().len(), 2);
    }

    #[test]
    fn test_dangers_recomputed_every_step() {
        let mut engine = FusionEngine::default();
        feed_dangerous_step(&mut engine, 0.1);
        engine.identify_dangers();
        assert_eq!(engine.group(1).unwrap().dangers().len(), 1);

        // Everyone gone: registries keep actors for the retention window,
        // then the fused set and the danger list empty out together
        for _ in 0..3 {
            engine.update_camera(1, 1, &[]);
            engine.update_camera(1, 2, &[]);
            engine.update_camera(1, 3, &[]);
            engine.step();
        }
        engine.identify_dangers();
        assert!(engine.group(1).unwrap().fused().is_empty());
        assert!(engine.group(1).unwrap().dangers().is_empty());
    }
}
