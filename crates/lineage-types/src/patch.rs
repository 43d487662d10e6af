//! Tri-state field patches for partial updates.
//!
//! A partial-update request must distinguish three cases per field:
//! the key is absent (leave the field alone), the key is `null` (clear
//! the field), or the key carries a value (replace the field). An
//! `Option<T>` cannot express all three, so update payloads use
//! [`Patch<T>`] instead.
//!
//! Struct fields of this type must be annotated with
//! `#[serde(default, skip_serializing_if = "Patch::is_keep")]` so that an
//! absent JSON key deserializes to [`Patch::Keep`] and `Keep` never
//! appears in serialized output.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A three-state update instruction for a single optional field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the current value untouched (the key was absent).
    #[default]
    Keep,
    /// Replace the current value.
    Set(T),
    /// Clear the current value (the key was an explicit `null`).
    Clear,
}

impl<T> Patch<T> {
    /// Whether this patch leaves the field untouched.
    ///
    /// Used as a `skip_serializing_if` predicate.
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Borrow the replacement value, if any.
    pub const fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Keep | Self::Clear => None,
        }
    }
}

impl<T: Clone + PartialEq> Patch<T> {
    /// Apply this patch to a field slot, returning whether the value changed.
    pub fn apply(&self, slot: &mut Option<T>) -> bool {
        match self {
            Self::Keep => false,
            Self::Set(value) => {
                let changed = slot.as_ref() != Some(value);
                *slot = Some(value.clone());
                changed
            }
            Self::Clear => {
                let changed = slot.is_some();
                *slot = None;
                changed
            }
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // `Keep` is filtered out by `skip_serializing_if` at the field
        // level; if it reaches here it degrades to `null` (= Clear).
        match self {
            Self::Set(value) => serializer.serialize_some(value),
            Self::Keep | Self::Clear => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Self::Set(value),
            None => Self::Clear,
        })
    }
}
