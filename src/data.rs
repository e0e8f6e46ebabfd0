//! Field data mappings exchanged between definitions, overrides, and the
//! population engine.

use std::{
    any::Any,
    collections::{HashMap, hash_map},
    fmt,
};

use facet_core::{Facet, Shape};
use facet_reflect::{Partial, ReflectError};

/// Types that can be stored as a field value in a [`Data`] mapping.
///
/// Blanket-implemented; the `Clone` bound exists because the same override
/// data is re-applied independently for every element of a collection target.
pub trait FieldValue: Facet<'static> + Clone + 'static {}

impl<V> FieldValue for V where V: Facet<'static> + Clone + 'static {}

/// A single type-erased field value.
///
/// Records the shape of the wrapped value at construction time so the
/// population engine can type-check it against the destination field before
/// assignment — exact identity, no coercion.
pub struct Value {
    shape: &'static Shape,
    inner: Box<dyn Any>,
    clone_fn: fn(&dyn Any) -> Box<dyn Any>,
    apply_fn: fn(Box<dyn Any>, &mut Partial<'static>) -> std::result::Result<(), ReflectError>,
}

impl Value {
    /// Wraps a concrete value, recording its shape.
    pub fn new<V: FieldValue>(value: V) -> Self {
        Value {
            shape: V::SHAPE,
            inner: Box::new(value),
            clone_fn: clone_erased::<V>,
            apply_fn: apply_erased::<V>,
        }
    }

    /// The shape of the wrapped value.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// Borrows the wrapped value if it is a `V`.
    pub fn downcast_ref<V: 'static>(&self) -> Option<&V> {
        self.inner.downcast_ref()
    }

    /// Moves the wrapped value into the frame currently under construction.
    pub(crate) fn apply(
        self,
        partial: &mut Partial<'static>,
    ) -> std::result::Result<(), ReflectError> {
        (self.apply_fn)(self.inner, partial)
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Value {
            shape: self.shape,
            inner: (self.clone_fn)(self.inner.as_ref()),
            clone_fn: self.clone_fn,
            apply_fn: self.apply_fn,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.shape)
    }
}

fn clone_erased<V: FieldValue>(value: &dyn Any) -> Box<dyn Any> {
    let Some(value) = value.downcast_ref::<V>() else {
        unreachable!("erased value matches its recorded shape")
    };
    Box::new(value.clone())
}

fn apply_erased<V: FieldValue>(
    value: Box<dyn Any>,
    partial: &mut Partial<'static>,
) -> std::result::Result<(), ReflectError> {
    let Ok(value) = value.downcast::<V>() else {
        unreachable!("erased value matches its recorded shape")
    };
    partial.set(*value)?;
    Ok(())
}

/// The map structure for fixture data: field names to field values.
///
/// Returned by definitions and passed by callers as overrides. Keys are
/// unique; insertion order is irrelevant. Each value must exactly match the
/// destination field's declared type at apply time — use `.to_string()` for
/// `String` fields rather than passing a `&str`.
#[derive(Clone, Debug, Default)]
pub struct Data {
    values: HashMap<String, Value>,
}

impl Data {
    /// Creates an empty data mapping.
    pub fn new() -> Self {
        Data::default()
    }

    /// Inserts a field value, builder style.
    ///
    /// ```
    /// # use facet_factory::Data;
    /// let data = Data::new().set("id", 1u64).set("name", "foo".to_string());
    /// assert_eq!(data.get::<u64>("id"), Some(&1));
    /// ```
    pub fn set<V: FieldValue>(mut self, field: impl Into<String>, value: V) -> Self {
        self.insert(field, value);
        self
    }

    /// Inserts a field value, replacing any earlier value for that field.
    pub fn insert<V: FieldValue>(&mut self, field: impl Into<String>, value: V) {
        self.values.insert(field.into(), Value::new(value));
    }

    /// Inserts an already-erased [`Value`].
    pub fn insert_value(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// Borrows the value stored for `field` if present and of type `V`.
    pub fn get<V: 'static>(&self, field: &str) -> Option<&V> {
        self.values.get(field).and_then(|value| value.downcast_ref::<V>())
    }

    /// Whether a value is stored for `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Number of field values stored.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the mapping holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over stored field names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(field, value)| (field.as_str(), value))
    }
}

impl IntoIterator for Data {
    type Item = (String, Value);
    type IntoIter = hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
