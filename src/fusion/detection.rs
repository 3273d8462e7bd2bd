use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fusion::fusion_errors::FusionError;

/// Category labels the external detector is allowed to report.
/// Everything outside the monitored classes comes in as `Unknown` (the
/// detector maps out-of-palette class ids to the literal label "unknown").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Person,
    Bicycle,
    Car,
    Motorcycle,
    Bus,
    Train,
    Truck,
    Dog,
    Unknown,
}

impl FromStr for ObjectClass {
    type Err = FusionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" => Ok(ObjectClass::Person),
            "bicycle" => Ok(ObjectClass::Bicycle),
            "car" => Ok(ObjectClass::Car),
            "motorcycle" => Ok(ObjectClass::Motorcycle),
            "bus" => Ok(ObjectClass::Bus),
            "train" => Ok(ObjectClass::Train),
            "truck" => Ok(ObjectClass::Truck),
            "dog" => Ok(ObjectClass::Dog),
            "unknown" => Ok(ObjectClass::Unknown),
            other => Err(FusionError::UnknownClass(other.to_string())),
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ObjectClass::Person => "person",
            ObjectClass::Bicycle => "bicycle",
            ObjectClass::Car => "car",
            ObjectClass::Motorcycle => "motorcycle",
            ObjectClass::Bus => "bus",
            ObjectClass::Train => "train",
            ObjectClass::Truck => "truck",
            ObjectClass::Dog => "dog",
            ObjectClass::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Color labels of the external color classifier's palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectColor {
    Black,
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Gray,
}

impl FromStr for ObjectColor {
    type Err = FusionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "black" => Ok(ObjectColor::Black),
            "white" => Ok(ObjectColor::White),
            "red" => Ok(ObjectColor::Red),
            "green" => Ok(ObjectColor::Green),
            "blue" => Ok(ObjectColor::Blue),
            "yellow" => Ok(ObjectColor::Yellow),
            "purple" => Ok(ObjectColor::Purple),
            "gray" => Ok(ObjectColor::Gray),
            other => Err(FusionError::UnknownColor(other.to_string())),
        }
    }
}

impl fmt::Display for ObjectColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ObjectColor::Black => "black",
            ObjectColor::White => "white",
            ObjectColor::Red => "red",
            ObjectColor::Green => "green",
            ObjectColor::Blue => "blue",
            ObjectColor::Yellow => "yellow",
            ObjectColor::Purple => "purple",
            ObjectColor::Gray => "gray",
        };
        write!(f, "{}", s)
    }
}

/// Common interface for anything carrying a detector class and a color label.
/// Enables one similarity predicate over detections, tracked actors and
/// fused identities.
pub trait Appearance {
    fn get_class(&self) -> ObjectClass;
    fn get_color(&self) -> ObjectColor;
}

/// Similarity predicate for cross-camera association: persons match on class
/// alone (color classification of people is unreliable), everything else
/// matches on class and color. Symmetric by construction.
pub fn same_object<A: Appearance, B: Appearance>(a: &A, b: &B) -> bool {
    same_labels(a.get_class(), a.get_color(), b.get_class(), b.get_color())
}

pub(crate) fn same_labels(
    class_a: ObjectClass,
    color_a: ObjectColor,
    class_b: ObjectClass,
    color_b: ObjectColor,
) -> bool {
    if class_a == ObjectClass::Person && class_b == ObjectClass::Person {
        return true;
    }
    class_a == class_b && color_a == color_b
}

/// One object detected in one camera during one step, as delivered by the
/// external detector/tracker. The local id is unique only within one
/// camera's tracker and may be recycled for new objects over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObject {
    id: u32,
    class: ObjectClass,
    color: ObjectColor,
    size: f32,
}

impl DetectedObject {
    /// Creates a new detection record. Rejects malformed sizes at the
    /// boundary: the normalized area must be a finite value within [0;1].
    ///
    /// Basic usage:
    ///
    /// ```
    /// use fusion_rs::fusion::{DetectedObject, ObjectClass, ObjectColor};
    /// let detection = DetectedObject::new(5, ObjectClass::Car, ObjectColor::Red, 0.1).unwrap();
    /// ```
    pub fn new(
        id: u32,
        class: ObjectClass,
        color: ObjectColor,
        size: f32,
    ) -> Result<Self, FusionError> {
        if !size.is_finite() || !(0.0..=1.0).contains(&size) {
            return Err(FusionError::BadSize(format!(
                "normalized area must be finite and within [0;1], got {}",
                size
            )));
        }
        Ok(DetectedObject {
            id,
            class,
            color,
            size,
        })
    }
    pub fn get_id(&self) -> u32 {
        self.id
    }
    pub fn get_size(&self) -> f32 {
        self.size
    }
}

impl Appearance for DetectedObject {
    fn get_class(&self) -> ObjectClass {
        self.class
    }
    fn get_color(&self) -> ObjectColor {
        self.color
    }
}

mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        let class: ObjectClass = "car".parse().unwrap();
        assert_eq!(class, ObjectClass::Car);
        let color: ObjectColor = "red".parse().unwrap();
        assert_eq!(color, ObjectColor::Red);
        assert!("submarine".parse::<ObjectClass>().is_err());
        assert!("magenta".parse::<ObjectColor>().is_err());
    }

    #[test]
    fn test_reject_bad_size() {
        assert!(DetectedObject::new(1, ObjectClass::Car, ObjectColor::Red, -0.1).is_err());
        assert!(DetectedObject::new(1, ObjectClass::Car, ObjectColor::Red, 1.5).is_err());
        assert!(DetectedObject::new(1, ObjectClass::Car, ObjectColor::Red, f32::NAN).is_err());
        assert!(DetectedObject::new(1, ObjectClass::Car, ObjectColor::Red, 0.0).is_ok());
        assert!(DetectedObject::new(1, ObjectClass::Car, ObjectColor::Red, 1.0).is_ok());
    }

    #[test]
    fn test_same_object_symmetry() {
        let samples = vec![
            DetectedObject::new(1, ObjectClass::Car, ObjectColor::Red, 0.1).unwrap(),
            DetectedObject::new(2, ObjectClass::Car, ObjectColor::Blue, 0.1).unwrap(),
            DetectedObject::new(3, ObjectClass::Truck, ObjectColor::Red, 0.1).unwrap(),
            DetectedObject::new(4, ObjectClass::Person, ObjectColor::Red, 0.1).unwrap(),
            DetectedObject::new(5, ObjectClass::Person, ObjectColor::Gray, 0.1).unwrap(),
        ];
        for a in samples.iter() {
            for b in samples.iter() {
                assert_eq!(same_object(a, b), same_object(b, a));
            }
        }
    }

    #[test]
    fn test_persons_match_on_class_alone() {
        let one = DetectedObject::new(1, ObjectClass::Person, ObjectColor::Red, 0.1).unwrap();
        let two = DetectedObject::new(2, ObjectClass::Person, ObjectColor::Blue, 0.1).unwrap();
        assert!(same_object(&one, &two));

        let red_car = DetectedObject::new(3, ObjectClass::Car, ObjectColor::Red, 0.1).unwrap();
        let blue_car = DetectedObject::new(4, ObjectClass::Car, ObjectColor::Blue, 0.1).unwrap();
        assert!(!same_object(&red_car, &blue_car));
        assert!(!same_object(&red_car, &one));
    }
}
