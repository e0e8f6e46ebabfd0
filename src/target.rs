//! Population targets: the closed set of container shapes [`Factory::create`]
//! accepts — single instances, owning pointers, and collections of either.
//!
//! [`Factory::create`]: crate::Factory::create

use facet_core::Facet;

use crate::FactoryError;

/// A fixture model type.
///
/// Models are plain structs deriving `Facet`, registered with the [`model!`]
/// macro (which also generates their [`Slot`] and [`Target`] impls).
///
/// [`model!`]: crate::model
pub trait Model: Facet<'static> + Sized + 'static {}

/// One storage slot for a populated instance: the instance itself or an
/// owning pointer to it.
pub trait Slot {
    /// The model type stored in this slot.
    type Model: Model;

    /// Stores a freshly populated instance and returns a reference to it.
    ///
    /// Pointer slots allocate anew and are reset wholesale: a previously
    /// stored instance is discarded, never merged with.
    fn put(&mut self, instance: Self::Model) -> &Self::Model;
}

impl<M: Model> Slot for Box<M> {
    type Model = M;

    fn put(&mut self, instance: M) -> &M {
        *self = Box::new(instance);
        &**self
    }
}

impl<M: Model> Slot for Option<Box<M>> {
    type Model = M;

    fn put(&mut self, instance: M) -> &M {
        &**self.insert(Box::new(instance))
    }
}

/// A population target for [`Factory::create`]: a single slot or a
/// collection of slots.
///
/// Implemented for `Box<M>`, `Option<Box<M>>`, `Vec<S>`, `[S; N]`, and `[S]`
/// where `S` is any slot shape; the [`model!`] macro provides the impl for
/// the bare model type itself.
///
/// [`Factory::create`]: crate::Factory::create
/// [`model!`]: crate::model
pub trait Target {
    /// The model type this target ultimately stores.
    type Model: Model;

    /// Fills every slot with a freshly built instance, handing each stored
    /// instance to `persist` in slot order.
    ///
    /// The first failing build aborts: earlier slots keep their new
    /// instances, later slots are left untouched.
    fn fill(
        &mut self,
        build: &mut dyn FnMut() -> Result<Self::Model, FactoryError>,
        persist: &mut dyn FnMut(&Self::Model),
    ) -> Result<(), FactoryError>;
}

/// Fills a single slot. Used by the generated single-model [`Target`] impls.
#[doc(hidden)]
pub fn fill_slot<S: Slot>(
    slot: &mut S,
    build: &mut dyn FnMut() -> Result<S::Model, FactoryError>,
    persist: &mut dyn FnMut(&S::Model),
) -> Result<(), FactoryError> {
    let stored = slot.put(build()?);
    persist(stored);
    Ok(())
}

fn fill_slots<'a, S: Slot + 'a>(
    slots: impl IntoIterator<Item = &'a mut S>,
    build: &mut dyn FnMut() -> Result<S::Model, FactoryError>,
    persist: &mut dyn FnMut(&S::Model),
) -> Result<(), FactoryError> {
    for slot in slots {
        let stored = slot.put(build()?);
        persist(stored);
    }
    Ok(())
}

impl<M: Model> Target for Box<M> {
    type Model = M;

    fn fill(
        &mut self,
        build: &mut dyn FnMut() -> Result<M, FactoryError>,
        persist: &mut dyn FnMut(&M),
    ) -> Result<(), FactoryError> {
        fill_slot(self, build, persist)
    }
}

impl<M: Model> Target for Option<Box<M>> {
    type Model = M;

    fn fill(
        &mut self,
        build: &mut dyn FnMut() -> Result<M, FactoryError>,
        persist: &mut dyn FnMut(&M),
    ) -> Result<(), FactoryError> {
        fill_slot(self, build, persist)
    }
}

impl<S: Slot> Target for [S] {
    type Model = S::Model;

    fn fill(
        &mut self,
        build: &mut dyn FnMut() -> Result<S::Model, FactoryError>,
        persist: &mut dyn FnMut(&S::Model),
    ) -> Result<(), FactoryError> {
        fill_slots(self.iter_mut(), build, persist)
    }
}

impl<S: Slot, const N: usize> Target for [S; N] {
    type Model = S::Model;

    fn fill(
        &mut self,
        build: &mut dyn FnMut() -> Result<S::Model, FactoryError>,
        persist: &mut dyn FnMut(&S::Model),
    ) -> Result<(), FactoryError> {
        fill_slots(self.iter_mut(), build, persist)
    }
}

impl<S: Slot> Target for Vec<S> {
    type Model = S::Model;

    fn fill(
        &mut self,
        build: &mut dyn FnMut() -> Result<S::Model, FactoryError>,
        persist: &mut dyn FnMut(&S::Model),
    ) -> Result<(), FactoryError> {
        fill_slots(self.iter_mut(), build, persist)
    }
}

/// Registers struct types as fixture models.
///
/// Generates the [`Model`], [`Slot`], and [`Target`] implementations that
/// let each listed type be populated directly and inside pointer or
/// collection targets.
///
/// ```
/// use facet::Facet;
///
/// #[derive(Facet, Debug, Default)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// #[derive(Facet, Debug, Default)]
/// struct Order {
///     number: u32,
/// }
///
/// facet_factory::model!(User, Order);
/// ```
#[macro_export]
macro_rules! model {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Model for $ty {}

        impl $crate::Slot for $ty {
            type Model = $ty;

            fn put(&mut self, instance: $ty) -> &$ty {
                *self = instance;
                &*self
            }
        }

        impl $crate::Target for $ty {
            type Model = $ty;

            fn fill(
                &mut self,
                build: &mut dyn ::core::ops::FnMut() -> ::core::result::Result<$ty, $crate::FactoryError>,
                persist: &mut dyn ::core::ops::FnMut(&$ty),
            ) -> ::core::result::Result<(), $crate::FactoryError> {
                $crate::fill_slot(self, build, persist)
            }
        }
    )+};
}
