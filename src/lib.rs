#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    error::Error,
    fmt::{self, Display},
};

use facet_core::{Facet, Field, Shape, Type, UserType};
use facet_reflect::{Partial, ReflectError};

mod data;
mod target;

pub use data::{Data, FieldValue, Value};
pub use target::{Model, Slot, Target};

#[doc(hidden)]
pub use target::fill_slot;

/// Error type for fixture creation.
#[derive(Debug)]
pub struct FactoryError {
    kind: FactoryErrorKind,
}

impl FactoryError {
    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &FactoryErrorKind {
        &self.kind
    }
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = &self.kind;
        write!(f, "{kind}")
    }
}
impl Error for FactoryError {}

impl<K: Into<FactoryErrorKind>> From<K> for FactoryError {
    fn from(value: K) -> Self {
        let kind = value.into();
        FactoryError { kind }
    }
}

/// Detailed classification of fixture creation errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum FactoryErrorKind {
    /// No definition is registered for the target's model type.
    DefinitionNotFound(&'static Shape),
    /// The data references a field the model type doesn't have.
    NoSuchField {
        /// The unknown field name.
        field: String,
        /// The model shape the field was looked up on.
        shape: &'static Shape,
    },
    /// The field exists but the reflection system refused to write it.
    FieldNotSettable {
        /// The rejected field name.
        field: String,
        /// The model shape the field belongs to.
        shape: &'static Shape,
    },
    /// A data value's type is not identical to the field's declared type.
    TypeMismatch {
        /// The field being assigned.
        field: String,
        /// The field's declared shape.
        expected: &'static Shape,
        /// The shape of the provided value.
        provided: &'static Shape,
    },
    /// The model type cannot be populated (only plain structs are).
    UnsupportedShape(String),
    /// Error from the reflection system while building an instance.
    Reflect(ReflectError),
}

impl Display for FactoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryErrorKind::DefinitionNotFound(shape) => {
                write!(f, "definition for type `{shape}` not found")
            }
            FactoryErrorKind::NoSuchField { field, shape } => {
                write!(f, "no such field `{field}` in `{shape}`")
            }
            FactoryErrorKind::FieldNotSettable { field, shape } => {
                write!(f, "cannot set field `{field}` on `{shape}`")
            }
            FactoryErrorKind::TypeMismatch {
                field,
                expected,
                provided,
            } => {
                write!(
                    f,
                    "provided value type ({provided}) didn't match model field type ({expected}) for field `{field}`"
                )
            }
            FactoryErrorKind::UnsupportedShape(msg) => write!(f, "unsupported shape: {msg}"),
            FactoryErrorKind::Reflect(reflect_error) => write!(f, "{reflect_error}"),
        }
    }
}

impl From<ReflectError> for FactoryErrorKind {
    fn from(value: ReflectError) -> Self {
        Self::Reflect(value)
    }
}

type Result<T> = std::result::Result<T, FactoryError>;

/// A definition wraps the data creation logic that fills one model type.
///
/// It receives the caller's override values, so related fields can be derived
/// from them, but its output never shadows an explicit override — the merge
/// re-applies every override key afterwards.
pub type Definition = Box<dyn Fn(&Data) -> Data>;

/// Called with a reference to every model instance after it has been
/// populated, e.g. to store it in a database. The reference downcasts to the
/// concrete model type.
pub type PersistHandler = Box<dyn Fn(&dyn Any)>;

/// A model factory that creates populated fixtures on the fly for testing.
///
/// Definitions are registered per model type with [`Factory::define`];
/// [`Factory::create`] then fills any [`Target`] holding that model: the
/// model itself, `Box<M>`, `Option<Box<M>>` (allocated on demand), or arrays
/// and vectors of those.
///
/// The registry and persist handler are plain owned state. Registration is
/// expected to happen during test setup; the factory performs no internal
/// locking, so concurrent use must be serialized by the caller.
pub struct Factory {
    definitions: HashMap<TypeId, Definition>,
    persist_handler: Option<PersistHandler>,
}

impl Factory {
    /// Creates a factory with an empty registry and no persist handler.
    pub fn new() -> Self {
        Factory {
            definitions: HashMap::new(),
            persist_handler: None,
        }
    }

    /// Registers the definition for model type `M`, replacing any earlier
    /// one. Returns the factory for chaining.
    ///
    /// # Example
    /// ```
    /// # use facet::Facet;
    /// # use facet_factory::{Data, Factory};
    /// #[derive(Facet, Debug, Default)]
    /// struct User {
    ///     id: u64,
    ///     name: String,
    /// }
    ///
    /// facet_factory::model!(User);
    ///
    /// let mut factory = Factory::new();
    /// factory.define::<User>(|overrides| {
    ///     // definitions may consult override values to derive related fields
    ///     let id = overrides.get::<u64>("id").copied().unwrap_or(1);
    ///     Data::new()
    ///         .set("id", id)
    ///         .set("name", format!("user-{id}"))
    /// });
    /// ```
    pub fn define<M: Model>(&mut self, definition: impl Fn(&Data) -> Data + 'static) -> &mut Self {
        log::trace!("Registering definition for {}", M::SHAPE);
        self.definitions
            .insert(TypeId::of::<M>(), Box::new(definition));
        self
    }

    /// Sets the handler called for every created model instance, replacing
    /// any earlier one. Wire your database layer for persistence here.
    pub fn set_persist_handler(&mut self, handler: impl Fn(&dyn Any) + 'static) {
        self.persist_handler = Some(Box::new(handler));
    }

    /// Creates model instances in `target` from generated data only.
    ///
    /// Equivalent to [`Factory::create_with`] with empty overrides.
    pub fn create<T: Target + ?Sized>(&self, target: &mut T) -> Result<()> {
        self.create_with(target, Data::new())
    }

    /// Creates model instances in `target`, overriding generated field
    /// values with `overrides`.
    ///
    /// The target may be:
    /// - a single model value (`M`)
    /// - an owning pointer (`Box<M>`, or `Option<Box<M>>` which is allocated
    ///   on demand)
    /// - an array, slice, or `Vec` of any of those
    ///
    /// Collections are filled element by element over their existing length
    /// (never resized), each element from an independently merged copy of the
    /// same overrides. Pointer slots are reset with a fresh instance, never
    /// merged with. After each instance is populated the persist handler, if
    /// set, is invoked with a reference to it; the first failing instance
    /// aborts the call, leaving earlier elements populated and later ones
    /// untouched.
    ///
    /// # Example
    /// ```
    /// # use facet::Facet;
    /// # use facet_factory::{Data, Factory};
    /// #[derive(Facet, Debug, PartialEq, Default)]
    /// struct User {
    ///     id: u64,
    ///     name: String,
    /// }
    ///
    /// facet_factory::model!(User);
    ///
    /// # fn main() -> Result<(), facet_factory::FactoryError> {
    /// let mut factory = Factory::new();
    /// factory.define::<User>(|_| {
    ///     Data::new().set("id", 1u64).set("name", "foo".to_string())
    /// });
    ///
    /// let mut user = User::default();
    /// factory.create_with(&mut user, Data::new().set("id", 2u64))?;
    /// assert_eq!(user, User { id: 2, name: "foo".to_string() });
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_with<T: Target + ?Sized>(&self, target: &mut T, overrides: Data) -> Result<()> {
        log::trace!("Creating instance(s) of {}", T::Model::SHAPE);

        let Some(definition) = self.definitions.get(&TypeId::of::<T::Model>()) else {
            return Err(FactoryErrorKind::DefinitionNotFound(T::Model::SHAPE).into());
        };

        target.fill(
            &mut || build_instance::<T::Model>(merge(definition, &overrides)),
            &mut |instance| {
                if let Some(handler) = &self.persist_handler {
                    log::trace!("Invoking persist handler for {}", T::Model::SHAPE);
                    handler(instance as &dyn Any);
                }
            },
        )
    }
}

impl Default for Factory {
    fn default() -> Self {
        Factory::new()
    }
}

/// Generates the data for one instance: the definition runs against the
/// overrides, then every override key is re-applied so overrides always win,
/// even for keys the definition also set.
fn merge(definition: &Definition, overrides: &Data) -> Data {
    let mut data = definition(overrides);
    for (field, value) in overrides.clone() {
        data.insert_value(field, value);
    }
    data
}

/// Builds a single populated model instance from merged data.
fn build_instance<M: Model>(data: Data) -> Result<M> {
    log::trace!("Building instance of {}", M::SHAPE);
    let mut typed_partial = Partial::alloc::<M>()?;
    {
        let partial = typed_partial.inner_mut();
        populate(partial, data)?;
    }
    let boxed_value = typed_partial.build()?;
    Ok(*boxed_value)
}

/// Fills the struct under construction with the provided data, then defaults
/// every remaining field so the result mirrors population of a zero value.
fn populate(partial: &mut Partial<'static>, data: Data) -> Result<()> {
    let shape = partial.shape();
    let Type::User(UserType::Struct(struct_def)) = &shape.ty else {
        return Err(FactoryErrorKind::UnsupportedShape(format!(
            "cannot populate `{shape}`, model types must be plain structs"
        ))
        .into());
    };

    for (field, value) in data {
        set_field(partial, shape, struct_def.fields, &field, value)?;
    }

    for (index, field) in struct_def.fields.iter().enumerate() {
        if !partial.is_field_set(index)? {
            log::trace!("Field `{}` not covered by data, defaulting", field.name);
            partial.begin_nth_field(index)?;
            partial.set_default()?;
            partial.end()?;
        }
    }

    Ok(())
}

/// Sets a single named field of the struct under construction.
fn set_field(
    partial: &mut Partial<'static>,
    shape: &'static Shape,
    fields: &'static [Field],
    name: &str,
    value: Value,
) -> Result<()> {
    let Some(field) = fields.iter().find(|field| field.name == name) else {
        return Err(FactoryErrorKind::NoSuchField {
            field: name.to_string(),
            shape,
        }
        .into());
    };

    // Shape equality is type identity, compared by ConstTypeId.
    let field_shape = field.shape;
    if field_shape != value.shape() {
        return Err(FactoryErrorKind::TypeMismatch {
            field: name.to_string(),
            expected: field_shape,
            provided: value.shape(),
        }
        .into());
    }

    if partial.begin_field(field.name).is_err() {
        return Err(FactoryErrorKind::FieldNotSettable {
            field: name.to_string(),
            shape,
        }
        .into());
    }
    value.apply(partial)?;
    partial.end()?;
    Ok(())
}
