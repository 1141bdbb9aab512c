//! Manipulable items and the attribute vocabulary used to classify them.
//!
//! Each activity kind declares its attribute set once, as a variant of
//! [`Attributes`]. Classification is always expressed as "criterion → bucket
//! key", so the validator never needs to know which lesson it is checking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an item within one activity round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Name of a destination group a learner can place items into.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey(String);

impl BucketKey {
    /// The single bucket used by include/exclude sorting.
    pub const INCLUDED: &'static str = "included";

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn included() -> Self {
        Self::new(Self::INCLUDED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BucketKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    Fly,
    Swim,
    Walk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Big,
    Small,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Posture {
    Sitting,
    Walking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Adult,
    Child,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Movement {
    pub fn as_str(self) -> &'static str {
        match self {
            Movement::Fly => "fly",
            Movement::Swim => "swim",
            Movement::Walk => "walk",
        }
    }
}

impl Size {
    pub fn as_str(self) -> &'static str {
        match self {
            Size::Big => "big",
            Size::Small => "small",
        }
    }
}

impl Posture {
    pub fn as_str(self) -> &'static str {
        match self {
            Posture::Sitting => "sitting",
            Posture::Walking => "walking",
        }
    }
}

impl AgeGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Adult => "adult",
            AgeGroup::Child => "child",
        }
    }
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }
}

/// An attribute an activity can sort or group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Color,
    Movement,
    Size,
    Bow,
    Posture,
    AgeGroup,
    Gender,
    Hat,
    /// The "what is it" attribute: fruit name or object category.
    Kind,
}

/// Classification attributes, declared once per activity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attributes {
    Animal {
        color: String,
        movement: Movement,
    },
    Bear {
        size: Size,
        has_bow: bool,
        color: String,
    },
    Fish {
        size: Size,
        color: String,
    },
    Cat {
        posture: Posture,
        color: String,
    },
    Person {
        age: AgeGroup,
        gender: Gender,
        has_hat: bool,
    },
    Fruit {
        fruit: String,
        size: Size,
    },
    Object {
        category: String,
    },
    Cube {
        position: usize,
    },
}

impl Attributes {
    /// The bucket an item falls into under `criterion`, or `None` when the
    /// item's kind does not carry that attribute.
    pub fn bucket_for(&self, criterion: Criterion) -> Option<BucketKey> {
        let value: &str = match (self, criterion) {
            (Attributes::Animal { color, .. }, Criterion::Color)
            | (Attributes::Bear { color, .. }, Criterion::Color)
            | (Attributes::Fish { color, .. }, Criterion::Color)
            | (Attributes::Cat { color, .. }, Criterion::Color) => color,
            (Attributes::Animal { movement, .. }, Criterion::Movement) => movement.as_str(),
            (Attributes::Bear { size, .. }, Criterion::Size)
            | (Attributes::Fish { size, .. }, Criterion::Size)
            | (Attributes::Fruit { size, .. }, Criterion::Size) => size.as_str(),
            (Attributes::Bear { has_bow, .. }, Criterion::Bow) => {
                if *has_bow {
                    "bow"
                } else {
                    "no_bow"
                }
            }
            (Attributes::Cat { posture, .. }, Criterion::Posture) => posture.as_str(),
            (Attributes::Person { age, .. }, Criterion::AgeGroup) => age.as_str(),
            (Attributes::Person { gender, .. }, Criterion::Gender) => gender.as_str(),
            (Attributes::Person { has_hat, .. }, Criterion::Hat) => {
                if *has_hat {
                    "hat"
                } else {
                    "no_hat"
                }
            }
            (Attributes::Fruit { fruit, .. }, Criterion::Kind) => fruit,
            (Attributes::Object { category }, Criterion::Kind) => category,
            _ => return None,
        };
        Some(BucketKey::new(value))
    }
}

/// An item as authored by the content layer, before it is given an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Display tag, opaque to the engine (emoji, image name, ...).
    pub tag: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl ItemSpec {
    pub fn new(tag: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            tag: tag.into(),
            attributes,
        }
    }
}

/// An item taking part in a round. Immutable once the round starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManipulableItem {
    pub id: ItemId,
    pub tag: String,
    pub attributes: Attributes,
}

/// A named partition key: every item goes to the bucket its `criterion`
/// value names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub name: String,
    pub criterion: Criterion,
}

impl GroupDefinition {
    pub fn new(name: impl Into<String>, criterion: Criterion) -> Self {
        Self {
            name: name.into(),
            criterion,
        }
    }

    pub fn classify(&self, item: &ManipulableItem) -> Option<BucketKey> {
        item.attributes.bucket_for(self.criterion)
    }
}

/// Binary membership test used by include/exclude sorting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub criterion: Criterion,
    pub value: String,
}

impl Predicate {
    pub fn new(criterion: Criterion, value: impl Into<String>) -> Self {
        Self {
            criterion,
            value: value.into(),
        }
    }

    pub fn matches(&self, item: &ManipulableItem) -> bool {
        item.attributes
            .bucket_for(self.criterion)
            .is_some_and(|bucket| bucket.as_str() == self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bear(size: Size, has_bow: bool, color: &str) -> ManipulableItem {
        ManipulableItem {
            id: ItemId(1),
            tag: "🧸".to_string(),
            attributes: Attributes::Bear {
                size,
                has_bow,
                color: color.to_string(),
            },
        }
    }

    #[test]
    fn test_bucket_for_boolean_attributes() {
        let with_bow = bear(Size::Big, true, "brown");
        let without_bow = bear(Size::Small, false, "white");

        assert_eq!(
            with_bow.attributes.bucket_for(Criterion::Bow),
            Some(BucketKey::new("bow"))
        );
        assert_eq!(
            without_bow.attributes.bucket_for(Criterion::Bow),
            Some(BucketKey::new("no_bow"))
        );
    }

    #[test]
    fn test_bucket_for_missing_attribute() {
        let item = bear(Size::Big, true, "brown");
        assert_eq!(item.attributes.bucket_for(Criterion::Movement), None);
        assert_eq!(
            Attributes::Cube { position: 0 }.bucket_for(Criterion::Color),
            None
        );
    }

    #[test]
    fn test_predicate_matches() {
        let predicate = Predicate::new(Criterion::Color, "brown");
        assert!(predicate.matches(&bear(Size::Big, false, "brown")));
        assert!(!predicate.matches(&bear(Size::Big, false, "white")));
    }

    #[test]
    fn test_item_spec_from_authored_json() {
        let json = r#"[
            {"tag": "🐦", "kind": "animal", "color": "blue", "movement": "fly"},
            {"tag": "🍎", "kind": "fruit", "fruit": "apple", "size": "small"}
        ]"#;
        let specs: Vec<ItemSpec> = serde_json::from_str(json).unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(
            specs[0].attributes,
            Attributes::Animal {
                color: "blue".to_string(),
                movement: Movement::Fly,
            }
        );
        assert_eq!(
            specs[1].attributes.bucket_for(Criterion::Kind),
            Some(BucketKey::new("apple"))
        );
    }
}
