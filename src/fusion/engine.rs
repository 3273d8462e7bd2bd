use std::collections::BTreeMap;
use std::fmt;

use crate::fusion::camera::MAX_STALE_STEPS;
use crate::fusion::dangers::IntersectionRule;
use crate::fusion::detection::DetectedObject;
use crate::fusion::group::Group;

/// Central fusion system: owns the camera groups and drives the
/// ingest -> fuse -> danger-evaluate cycle, one discrete step at a time.
/// In-memory only; a monitoring session starts from a fresh instance.
pub struct FusionEngine {
    groups: BTreeMap<u32, Group>,
    current_step: u64,
    // Max number of steps an actor survives in a registry without a sighting. Default is 2
    max_stale_steps: u64,
    rule: IntersectionRule,
}

impl FusionEngine {
    /// Creates default instance of FusionEngine
    ///
    /// Basic usage:
    ///
    /// ```
    /// use fusion_rs::fusion::FusionEngine;
    /// let mut engine = FusionEngine::default();
    /// ```
    pub fn default() -> Self {
        FusionEngine {
            groups: BTreeMap::new(),
            current_step: 0,
            max_stale_steps: MAX_STALE_STEPS,
            rule: IntersectionRule::default(),
        }
    }
    /// Creates new instance of FusionEngine
    ///
    /// Basic usage:
    ///
    /// ```
    /// use fusion_rs::fusion::{FusionEngine, IntersectionRule};
    /// let max_stale_steps: u64 = 2;
    /// let rule = IntersectionRule::new(3, [1, 2]);
    /// let mut engine = FusionEngine::new(max_stale_steps, rule);
    /// ```
    pub fn new(_max_stale_steps: u64, _rule: IntersectionRule) -> Self {
        FusionEngine {
            groups: BTreeMap::new(),
            current_step: 0,
            max_stale_steps: _max_stale_steps,
            rule: _rule,
        }
    }
    /// Feeds one camera's detections for the current step. The group and
    /// the camera are registered on first use, so calling with an empty
    /// slice is also how cameras are announced up front. Triggers the
    /// registry's eviction pass even when there is nothing to ingest.
    pub fn update_camera(
        &mut self,
        group_id: u32,
        camera_id: u32,
        detections: &[DetectedObject],
    ) {
        let current_step = self.current_step;
        let max_stale_steps = self.max_stale_steps;
        let group = self
            .groups
            .entry(group_id)
            .or_insert_with(|| Group::new(format!("group-{}", group_id)));
        group
            .camera_entry(camera_id)
            .update(detections, current_step, max_stale_steps);
    }
    /// Advances the step counter, then rebuilds every group's fused
    /// identity set. Must be called after all cameras of a group were fed
    /// for this step.
    pub fn step(&mut self) {
        self.current_step += 1;
        for (_, group) in self.groups.iter_mut() {
            group.fuse();
        }
    }
    /// Runs the danger heuristics for every group over the fused state
    /// produced by the last `step()` call.
    pub fn identify_dangers(&mut self) {
        let rule = self.rule.clone();
        for (_, group) in self.groups.iter_mut() {
            group.identify_dangers(&rule);
        }
    }
    pub fn current_step(&self) -> u64 {
        self.current_step
    }
    pub fn group(&self, group_id: u32) -> Option<&Group> {
        self.groups.get(&group_id)
    }
    pub fn groups(&self) -> &BTreeMap<u32, Group> {
        &self.groups
    }
}

impl fmt::Display for FusionEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Step: {}\n\tGroups: {}",
            self.current_step,
            self.groups.len()
        )
    }
}

mod tests {
    use super::*;
    use crate::fusion::detection::{ObjectClass, ObjectColor};

    fn detection(id: u32, class: ObjectClass, color: ObjectColor, size: f32) -> DetectedObject {
        DetectedObject::new(id, class, color, size).unwrap()
    }

    #[test]
    fn test_idempotent_registration() {
        let mut engine = FusionEngine::default();
        engine.update_camera(1, 1, &[]);
        engine.update_camera(1, 1, &[]);
        engine.update_camera(1, 2, &[]);

        let group = engine.group(1).unwrap();
        assert_eq!(group.cameras().len(), 2);
        assert_eq!(group.camera(1).unwrap().get_name(), "CAM-1");
        assert!(group.camera(1).unwrap().is_empty());
    }

    #[test]
    fn test_step_counter() {
        let mut engine = FusionEngine::default();
        assert_eq!(engine.current_step(), 0);
        engine.step();
        engine.step();
        assert_eq!(engine.current_step(), 2);
    }

    #[test]
    fn test_groups_are_isolated() {
        let mut engine = FusionEngine::default();
        engine.update_camera(1, 1, &[detection(5, ObjectClass::Car, ObjectColor::Red, 0.1)]);
        engine.update_camera(2, 1, &[detection(9, ObjectClass::Car, ObjectColor::Red, 0.1)]);
        engine.step();

        // A lone car per group: no cross-group association ever happens
        assert!(engine.group(1).unwrap().fused().is_empty());
        assert!(engine.group(2).unwrap().fused().is_empty());
    }

    #[test]
    fn test_three_camera_sequence() {
        // Three cameras watching the same crossing over a handful of steps:
        // a red car drives towards camera 3 while a pedestrian is on the
        // crossing watched by cameras 1 and 2
        let mut engine = FusionEngine::default();
        let car_sizes = vec![0.10, 0.12, 0.14, 0.16];
        let person_sizes = vec![0.05, 0.05, 0.06, 0.06];

        for (car_size, person_size) in itertools::izip!(car_sizes, person_sizes) {
            engine.update_camera(
                1,
                1,
                &[
                    detection(2, ObjectClass::Car, ObjectColor::Red, car_size),
                    detection(1, ObjectClass::Person, ObjectColor::Gray, person_size),
                ],
            );
            engine.update_camera(
                1,
                2,
                &[detection(3, ObjectClass::Person, ObjectColor::Gray, person_size)],
            );
            engine.update_camera(
                1,
                3,
                &[detection(4, ObjectClass::Car, ObjectColor::Red, car_size)],
            );
            engine.step();
            engine.identify_dangers();

            let group = engine.group(1).unwrap();
            assert_eq!(group.fused().len(), 2);
            assert_eq!(group.dangers().len(), 1);
        }

        // Fused ids stayed stable over the whole sequence
        let group = engine.group(1).unwrap();
        let mut ids: Vec<u64> = group.fused().iter().map(|identity| identity.get_id()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }
}
