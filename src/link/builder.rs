use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use super::{composite_binding, field_binding, AccessError, Linker};
use crate::codec::CodecRef;
use crate::value::{Primitive, Value};

/// Hand-written linker for `T`, for types that cannot derive [`Linked`](super::Linked)
/// or that expose state through getter/setter pairs.
///
/// ```rust
/// use nbtlink::codec::builtin;
/// use nbtlink::link::{Linker, LinkerLookup};
/// use nbtlink::DataTree;
///
/// #[derive(Default)]
/// struct Health {
///     current: i32,
///     max: i32,
/// }
///
/// impl Health {
///     fn ratio(&self) -> f64 { f64::from(self.current) / f64::from(self.max.max(1)) }
///     fn set_ratio(&mut self, ratio: f64) { self.current = (ratio * f64::from(self.max)) as i32 }
/// }
///
/// let linker = Linker::builder::<Health>()
///     .field("max", builtin::INT.shared(), |h| &h.max, |h| &mut h.max)
///     .accessor("ratio", builtin::DOUBLE.shared(), Health::ratio, Health::set_ratio)
///     .build();
///
/// let mut data = DataTree::new();
/// data.put("max", 20);
/// data.put("ratio", 0.5);
///
/// let mut health = Health::default();
/// let report = linker.forward_link_into(&data, &mut health, &LinkerLookup::new());
/// assert!(report.is_complete());
/// assert_eq!((health.current, health.max), (10, 20));
/// ```
#[must_use]
pub struct LinkerBuilder<T> {
    linker: Linker,
    _host: PhantomData<fn() -> T>,
}

impl<T: Any> LinkerBuilder<T> {
    /// Starts a builder whose instances come from `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            linker: Linker::empty::<T>(Arc::new(move || Box::new(factory()) as Box<dyn Any>)),
            _host: PhantomData,
        }
    }

    /// Binds a member reached through a pair of projections.
    pub fn field<U: Primitive>(
        self,
        key: &str,
        codec: CodecRef,
        get: fn(&T) -> &U,
        get_mut: fn(&mut T) -> &mut U,
    ) -> Self {
        self.accessor(
            key,
            codec,
            move |host| get(host).clone(),
            move |host, value| *get_mut(host) = value,
        )
    }

    /// Binds a getter/setter pair.
    pub fn accessor<U, G, S>(mut self, key: &str, codec: CodecRef, getter: G, setter: S) -> Self
    where
        U: Primitive,
        G: Fn(&T) -> U + Send + Sync + 'static,
        S: Fn(&mut T, U) + Send + Sync + 'static,
    {
        let type_name = self.linker.type_name();
        let binding = field_binding(
            codec,
            move |host| {
                let host = host
                    .downcast_ref::<T>()
                    .ok_or(AccessError::WrongInstance { expected: type_name })?;
                Ok(getter(host).to_value())
            },
            move |host, value: Value| {
                let host = host
                    .downcast_mut::<T>()
                    .ok_or(AccessError::WrongInstance { expected: type_name })?;
                let value = U::from_value(value).map_err(|found| AccessError::KindMismatch {
                    expected: U::KIND,
                    found: found.kind(),
                })?;
                setter(host, value);
                Ok(())
            },
        );
        self.linker.insert_field(key, binding);
        self
    }

    /// Binds a nested object reached through `project`.
    pub fn composite<U: Any>(mut self, key: &str, project: fn(&mut T) -> &mut U) -> Self {
        let type_name = self.linker.type_name();
        let target_name = std::any::type_name::<U>();
        let binding = composite_binding(TypeId::of::<U>(), target_name, move |host, _, visit| {
            let host = host
                .downcast_mut::<T>()
                .ok_or(AccessError::WrongInstance { expected: type_name })?;
            visit(project(host));
            Ok(())
        });
        self.linker.insert_composite(key, binding);
        self
    }

    /// Binds an optional nested object. An empty slot is filled with an
    /// instance built by `U`'s linker before linking.
    pub fn optional_composite<U: Any>(
        mut self,
        key: &str,
        project: fn(&mut T) -> &mut Option<U>,
    ) -> Self {
        let type_name = self.linker.type_name();
        let target_name = std::any::type_name::<U>();
        let binding = composite_binding(TypeId::of::<U>(), target_name, move |host, target, visit| {
            let host = host
                .downcast_mut::<T>()
                .ok_or(AccessError::WrongInstance { expected: type_name })?;
            let slot = project(host);
            if slot.is_none() {
                let created = target
                    .create()
                    .downcast::<U>()
                    .map_err(|_| AccessError::Construct(target_name))?;
                *slot = Some(*created);
            }
            match slot.as_mut() {
                Some(nested) => {
                    visit(nested);
                    Ok(())
                }
                None => Err(AccessError::Construct(target_name)),
            }
        });
        self.linker.insert_composite(key, binding);
        self
    }

    /// Finishes the linker.
    pub fn build(self) -> Linker {
        self.linker
    }
}
