use std::collections::{BTreeMap, HashSet};

use log::debug;

use crate::fusion::detection::{same_labels, Appearance, ObjectClass, ObjectColor};
use crate::fusion::group::{FusedIdentity, Group};

impl Group {
    /// Rebuilds the fused identity set for this step from the current
    /// camera registries. The previous step's set is consulted only to
    /// decide id continuity, then discarded.
    ///
    /// Cameras are walked in ascending id order and actors in ascending
    /// local id order, so the result is a pure function of registry state
    /// plus the previous fused set. A claimed set guarantees that each
    /// (camera, local id) pair is absorbed into at most one fused identity
    /// per step.
    pub(crate) fn fuse(&mut self) {
        let previous = self.take_fused();
        let mut fused: Vec<FusedIdentity> = Vec::new();
        let mut claimed: HashSet<(u32, u32)> = HashSet::new();

        let camera_ids: Vec<u32> = self.cameras().keys().copied().collect();
        for &camera_id in camera_ids.iter() {
            let seed_ids: Vec<u32> = match self.camera(camera_id) {
                Some(camera) => camera.actors().keys().copied().collect(),
                None => continue,
            };
            for seed_local in seed_ids {
                if claimed.contains(&(camera_id, seed_local)) {
                    continue;
                }
                let (seed_class, seed_color) = match self
                    .camera(camera_id)
                    .and_then(|camera| camera.actor(seed_local))
                {
                    Some(actor) => (actor.get_class(), actor.get_color()),
                    None => continue,
                };

                // Searching for the same object in the other cameras of the group
                let same_objects =
                    self.search_same_object(camera_id, seed_class, seed_color, &claimed);
                if same_objects.is_empty() {
                    // Visible in a single camera only: no fused identity
                    continue;
                }

                // Identity continuity: a previous identity with the same
                // appearance keeps its id, otherwise allocate a fresh one.
                // This is intentionally coarse (no member ref overlap check),
                // so two same looking objects swapping between steps cannot
                // be told apart.
                let fused_id = match previous
                    .iter()
                    .find(|prev| {
                        same_labels(prev.get_class(), prev.get_color(), seed_class, seed_color)
                    })
                    .map(|prev| prev.get_id())
                {
                    Some(id) => id,
                    None => self.alloc_fused_id(),
                };

                let mut identity = FusedIdentity::new(fused_id, seed_class, seed_color);
                identity.add_member(camera_id, seed_local);
                claimed.insert((camera_id, seed_local));
                for (&other_camera, &other_local) in same_objects.iter() {
                    identity.add_member(other_camera, other_local);
                    claimed.insert((other_camera, other_local));
                }
                fused.push(identity);
            }
        }

        debug!(
            "group {}: fused {} identities across {} cameras",
            self.get_name(),
            fused.len(),
            camera_ids.len()
        );
        self.set_fused(fused);
    }

    /// Collects at most one unclaimed matching actor per other camera:
    /// first match in ascending local id order, not the best match.
    fn search_same_object(
        &self,
        current_camera: u32,
        class: ObjectClass,
        color: ObjectColor,
        claimed: &HashSet<(u32, u32)>,
    ) -> BTreeMap<u32, u32> {
        let mut found: BTreeMap<u32, u32> = BTreeMap::new();
        for (&camera_id, camera) in self.cameras().iter() {
            if camera_id == current_camera {
                continue;
            }
            for (&local_id, actor) in camera.actors().iter() {
                if claimed.contains(&(camera_id, local_id)) {
                    continue;
                }
                if same_labels(actor.get_class(), actor.get_color(), class, color) {
                    found.insert(camera_id, local_id);
                    break;
                }
            }
        }
        found
    }
}

mod tests {
    use std::collections::HashSet;

    use crate::fusion::detection::{Appearance, DetectedObject, ObjectClass, ObjectColor};
    use crate::fusion::{FusionEngine, Movement};

    fn car(id: u32, color: ObjectColor, size: f32) -> DetectedObject {
        DetectedObject::new(id, ObjectClass::Car, color, size).unwrap()
    }

    fn person(id: u32, size: f32) -> DetectedObject {
        DetectedObject::new(id, ObjectClass::Person, ObjectColor::Gray, size).unwrap()
    }

    #[test]
    fn test_two_camera_match() {
        let mut engine = FusionEngine::default();
        engine.update_camera(1, 1, &[car(5, ObjectColor::Red, 0.1)]);
        engine.update_camera(1, 2, &[car(9, ObjectColor::Red, 0.12)]);
        engine.step();

        let group = engine.group(1).unwrap();
        assert_eq!(group.fused().len(), 1);
        let identity = &group.fused()[0];
        assert_eq!(identity.get_class(), ObjectClass::Car);
        assert_eq!(identity.get_color(), ObjectColor::Red);
        assert_eq!(identity.seen_by(1), Some(5));
        assert_eq!(identity.seen_by(2), Some(9));
    }

    #[test]
    fn test_no_match_no_fusion() {
        let mut engine = FusionEngine::default();
        engine.update_camera(1, 1, &[car(5, ObjectColor::Red, 0.1)]);
        let truck = DetectedObject::new(9, ObjectClass::Truck, ObjectColor::Blue, 0.2).unwrap();
        engine.update_camera(1, 2, &[truck]);
        engine.step();

        assert!(engine.group(1).unwrap().fused().is_empty());
    }

    #[test]
    fn test_persons_fuse_across_colors() {
        let mut engine = FusionEngine::default();
        engine.update_camera(
            1,
            1,
            &[DetectedObject::new(1, ObjectClass::Person, ObjectColor::Red, 0.05).unwrap()],
        );
        engine.update_camera(
            1,
            2,
            &[DetectedObject::new(4, ObjectClass::Person, ObjectColor::Blue, 0.04).unwrap()],
        );
        engine.step();

        let group = engine.group(1).unwrap();
        assert_eq!(group.fused().len(), 1);
        assert_eq!(group.fused()[0].get_class(), ObjectClass::Person);
    }

    #[test]
    fn test_at_most_once_claim() {
        // Two red cars in camera 1 against a single red car in camera 2:
        // the camera 2 actor may be absorbed into one fused identity only
        let mut engine = FusionEngine::default();
        engine.update_camera(
            1,
            1,
            &[car(1, ObjectColor::Red, 0.1), car(2, ObjectColor::Red, 0.2)],
        );
        engine.update_camera(1, 2, &[car(7, ObjectColor::Red, 0.15)]);
        engine.step();

        let group = engine.group(1).unwrap();
        let mut seen: HashSet<(u32, u32)> = HashSet::new();
        for identity in group.fused() {
            for (&camera_id, &local_id) in identity.member_refs().iter() {
                assert!(seen.insert((camera_id, local_id)));
            }
        }
        assert_eq!(group.fused().len(), 1);
        assert_eq!(group.fused()[0].seen_by(1), Some(1));
        assert_eq!(group.fused()[0].seen_by(2), Some(7));
    }

    #[test]
    fn test_fused_id_stability_across_steps() {
        let mut engine = FusionEngine::default();
        for step in 1..=4 {
            let size = 0.1 + 0.01 * step as f32;
            engine.update_camera(1, 1, &[car(5, ObjectColor::Red, size)]);
            engine.update_camera(1, 2, &[car(9, ObjectColor::Red, size)]);
            engine.step();
            let group = engine.group(1).unwrap();
            assert_eq!(group.fused().len(), 1);
            assert_eq!(group.fused()[0].get_id(), 1);
        }
    }

    #[test]
    fn test_new_appearance_gets_fresh_id() {
        let mut engine = FusionEngine::default();
        engine.update_camera(1, 1, &[car(5, ObjectColor::Red, 0.1)]);
        engine.update_camera(1, 2, &[car(9, ObjectColor::Red, 0.1)]);
        engine.step();
        assert_eq!(engine.group(1).unwrap().fused()[0].get_id(), 1);

        // The red car disappears, a blue one shows up: new monotonic id
        engine.update_camera(1, 1, &[car(6, ObjectColor::Blue, 0.1)]);
        engine.update_camera(1, 2, &[car(11, ObjectColor::Blue, 0.1)]);
        engine.step();
        let fused = engine.group(1).unwrap().fused();
        let blue = fused
            .iter()
            .find(|identity| identity.get_color() == ObjectColor::Blue)
            .unwrap();
        assert_eq!(blue.get_id(), 2);
    }

    #[test]
    fn test_fusion_determinism() {
        let feed = |engine: &mut FusionEngine| {
            engine.update_camera(
                1,
                1,
                &[
                    car(1, ObjectColor::Red, 0.1),
                    car(2, ObjectColor::Blue, 0.2),
                    person(3, 0.05),
                ],
            );
            engine.update_camera(
                1,
                2,
                &[car(4, ObjectColor::Blue, 0.18), person(5, 0.04)],
            );
            engine.update_camera(1, 3, &[car(6, ObjectColor::Red, 0.09)]);
            engine.step();
        };

        let mut one = FusionEngine::default();
        let mut two = FusionEngine::default();
        feed(&mut one);
        feed(&mut two);

        assert_eq!(one.group(1).unwrap().fused(), two.group(1).unwrap().fused());
    }

    #[test]
    fn test_singleton_stays_in_registry_but_not_in_fused_view() {
        let mut engine = FusionEngine::default();
        engine.update_camera(1, 1, &[car(5, ObjectColor::Red, 0.1)]);
        engine.update_camera(1, 2, &[]);
        engine.step();

        let group = engine.group(1).unwrap();
        assert!(group.fused().is_empty());
        assert_eq!(group.camera(1).unwrap().len(), 1);
        assert_eq!(
            group.camera(1).unwrap().actor(5).unwrap().get_movement(),
            Movement::Approaching
        );
    }
}
