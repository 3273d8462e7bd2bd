use std::fmt;

#[derive(Debug)]
pub enum FusionError {
    BadSize(String),
    UnknownClass(String),
    UnknownColor(String),
    NoCamera(NoCameraInGroup),
    NoActor(NoActorInRegistry),
}

impl From<NoCameraInGroup> for FusionError {
    fn from(e: NoCameraInGroup) -> Self {
        FusionError::NoCamera(e)
    }
}

impl From<NoActorInRegistry> for FusionError {
    fn from(e: NoActorInRegistry) -> Self {
        FusionError::NoActor(e)
    }
}

impl From<String> for FusionError {
    fn from(e: String) -> Self {
        FusionError::BadSize(e)
    }
}

#[derive(Debug)]
pub struct NoCameraInGroup {
    pub txt: String,
}
impl fmt::Display for NoCameraInGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NoCameraInGroup: {}", self.txt)
    }
}

#[derive(Debug)]
pub struct NoActorInRegistry {
    pub txt: String,
}
impl fmt::Display for NoActorInRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NoActorInRegistry: {}", self.txt)
    }
}
