use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::fusion::actor::TrackedActor;
use crate::fusion::camera::CameraRegistry;
use crate::fusion::detection::{Appearance, ObjectClass, ObjectColor};
use crate::fusion::fusion_errors::{FusionError, NoActorInRegistry, NoCameraInGroup};

/// One real-world object as agreed upon by two or more cameras of a group.
/// Member refs are lookup keys (camera id to that camera's local id), never
/// owning references: they record where the object was last seen and must
/// only be resolved within the same step they were computed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FusedIdentity {
    id: u64,
    class: ObjectClass,
    color: ObjectColor,
    member_refs: BTreeMap<u32, u32>,
}

impl FusedIdentity {
    pub(crate) fn new(id: u64, class: ObjectClass, color: ObjectColor) -> Self {
        FusedIdentity {
            id,
            class,
            color,
            member_refs: BTreeMap::new(),
        }
    }
    pub(crate) fn add_member(&mut self, camera_id: u32, local_id: u32) {
        self.member_refs.entry(camera_id).or_insert(local_id);
    }
    pub fn get_id(&self) -> u64 {
        self.id
    }
    pub fn member_refs(&self) -> &BTreeMap<u32, u32> {
        &self.member_refs
    }
    /// Local id under which this identity was seen by the given camera, if any.
    pub fn seen_by(&self, camera_id: u32) -> Option<u32> {
        self.member_refs.get(&camera_id).copied()
    }
}

impl Appearance for FusedIdentity {
    fn get_class(&self) -> ObjectClass {
        self.class
    }
    fn get_color(&self) -> ObjectColor {
        self.color
    }
}

impl fmt::Display for FusedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut where_seen = String::new();
        for (camera_id, local_id) in self.member_refs.iter() {
            where_seen.push_str(&format!("CAM{} id {} ", camera_id, local_id));
        }
        write!(
            f,
            "[CommonId={}, Type={}, Color={}, From={}]",
            self.id, self.class, self.color, where_seen
        )
    }
}

/// All cameras covering one physical site (e.g. one intersection), the
/// fused identity pool they share and the dangers identified this step.
pub struct Group {
    name: String,
    cameras: BTreeMap<u32, CameraRegistry>,
    fused: Vec<FusedIdentity>,
    dangers: Vec<String>,
    next_fused_id: u64,
}

impl Group {
    pub fn new(name: String) -> Self {
        Group {
            name,
            cameras: BTreeMap::new(),
            fused: Vec::new(),
            dangers: Vec::new(),
            next_fused_id: 0,
        }
    }
    // Fused ids start at 1, grow strictly and are never reused, even when a
    // similar looking identity reappears much later
    pub(crate) fn alloc_fused_id(&mut self) -> u64 {
        self.next_fused_id += 1;
        self.next_fused_id
    }
    pub(crate) fn camera_entry(&mut self, camera_id: u32) -> &mut CameraRegistry {
        self.cameras
            .entry(camera_id)
            .or_insert_with(|| CameraRegistry::new(format!("CAM-{}", camera_id)))
    }
    pub(crate) fn set_fused(&mut self, fused: Vec<FusedIdentity>) {
        self.fused = fused;
    }
    pub(crate) fn take_fused(&mut self) -> Vec<FusedIdentity> {
        std::mem::take(&mut self.fused)
    }
    pub(crate) fn set_dangers(&mut self, dangers: Vec<String>) {
        self.dangers = dangers;
    }
    pub fn get_name(&self) -> &str {
        &self.name
    }
    pub fn camera(&self, camera_id: u32) -> Option<&CameraRegistry> {
        self.cameras.get(&camera_id)
    }
    pub fn cameras(&self) -> &BTreeMap<u32, CameraRegistry> {
        &self.cameras
    }
    /// This step's fused identities, in the order they were materialized.
    pub fn fused(&self) -> &[FusedIdentity] {
        &self.fused
    }
    /// This step's danger reports.
    pub fn dangers(&self) -> &[String] {
        &self.dangers
    }
    /// Resolves a fused member reference back to the per-camera actor it
    /// points at. Only valid within the step the fused set was computed in.
    pub fn resolve_member(
        &self,
        camera_id: u32,
        local_id: u32,
    ) -> Result<&TrackedActor, FusionError> {
        let camera = self.cameras.get(&camera_id).ok_or_else(|| {
            FusionError::from(NoCameraInGroup {
                txt: format!("no camera {} in group {}", camera_id, self.name),
            })
        })?;
        camera.actor(local_id).ok_or_else(|| {
            FusionError::from(NoActorInRegistry {
                txt: format!(
                    "no actor with local id {} in camera {} of group {}",
                    local_id, camera_id, self.name
                ),
            })
        })
    }
}

mod tests {
    use super::*;
    use crate::fusion::detection::DetectedObject;

    #[test]
    fn test_fused_id_allocation_is_strictly_increasing() {
        let mut group = Group::new("group-1".to_string());
        assert_eq!(group.alloc_fused_id(), 1);
        assert_eq!(group.alloc_fused_id(), 2);
        assert_eq!(group.alloc_fused_id(), 3);
    }

    #[test]
    fn test_member_ref_first_sighting_wins() {
        let mut identity = FusedIdentity::new(1, ObjectClass::Car, ObjectColor::Red);
        identity.add_member(2, 10);
        identity.add_member(2, 99);
        assert_eq!(identity.seen_by(2), Some(10));
    }

    #[test]
    fn test_resolve_member() {
        let mut group = Group::new("group-1".to_string());
        let detection =
            DetectedObject::new(5, ObjectClass::Car, ObjectColor::Red, 0.1).unwrap();
        group.camera_entry(1).update(&[detection], 1, 2);

        assert!(group.resolve_member(1, 5).is_ok());
        assert!(matches!(
            group.resolve_member(1, 6),
            Err(FusionError::NoActor(_))
        ));
        assert!(matches!(
            group.resolve_member(9, 5),
            Err(FusionError::NoCamera(_))
        ));
    }
}
