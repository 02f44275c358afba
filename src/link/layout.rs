//! Compile-time descriptions of a bindable type's members.
//!
//! `#[derive(Linked)]` emits one [`Layout`] per struct. Each [`Member`]
//! carries plain function pointers that project a `dyn Any` of the host type
//! onto the member, so a [`Linker`](super::Linker) can be assembled without
//! any runtime reflection.

use std::any::{Any, TypeId};
use std::fmt;

/// A type whose members can be bound to a [`DataTree`](crate::DataTree).
///
/// Usually derived:
///
/// ```rust
/// use nbtlink::Linked;
///
/// #[derive(Default, Linked)]
/// #[nbtlink(auto)]
/// pub struct Position {
///     pub x: f64,
///     pub y: f64,
///     pub z: f64,
/// }
///
/// let layout = Position::layout();
/// assert_eq!(layout.members.len(), 3);
/// ```
pub trait Linked: Any + Sized {
    /// The member table of this type.
    fn layout() -> Layout;

    /// Builds an instance to link into when a member of this type is absent.
    fn create() -> Self;
}

/// How members are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Every `pub` member is bound, plus any annotated one.
    Automatic,
    /// Only members annotated as field or composite are bound.
    Manual,
}

/// What a member was declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Decided by the codec registry: known types are fields, others composites.
    Auto,
    /// A plain field; its type must have a codec.
    Field,
    /// A nested object with its own linker.
    Composite,
    /// An embedded parent whose members are flattened into this type when
    /// the layout opts into inheritance.
    Base,
}

/// Projects a host `dyn Any` onto one of its members.
pub type Getter = fn(&dyn Any) -> Option<&dyn Any>;
/// Mutable counterpart of [`Getter`].
pub type GetterMut = fn(&mut dyn Any) -> Option<&mut dyn Any>;
/// Stores a boxed value into an `Option` member. Returns `false` on a type mismatch.
pub type Filler = fn(&mut dyn Any, Box<dyn Any>) -> bool;

/// One member of a [`Layout`].
#[derive(Clone, Copy)]
pub struct Member {
    /// The Rust member name.
    pub name: &'static str,
    /// The tree key, the member name unless overridden.
    pub key: &'static str,
    /// The declared role.
    pub role: Role,
    /// Whether the member is `pub`.
    pub public: bool,
    /// Whether the member is an `Option<U>`; `type_id` then names `U`.
    pub optional: bool,
    /// Type of the member (of `U` for `Option<U>`).
    pub type_id: TypeId,
    /// Name of that type, for diagnostics.
    pub type_name: &'static str,
    /// Shared access. `None` for a host of another type or an empty `Option`.
    pub get: Getter,
    /// Exclusive access. `None` for a host of another type or an empty `Option`.
    pub get_mut: GetterMut,
    /// Present for optional members.
    pub fill: Option<Filler>,
    /// The embedded type's layout, for [`Role::Base`] members.
    pub layout: Option<fn() -> Layout>,
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("role", &self.role)
            .field("public", &self.public)
            .field("optional", &self.optional)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// The member table of a [`Linked`] type.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Name of the described type.
    pub type_name: &'static str,
    /// Id of the described type.
    pub type_id: TypeId,
    /// Member selection rule.
    pub mode: LinkMode,
    /// Whether [`Role::Base`] members are flattened.
    pub inherit: bool,
    /// Members in declaration order.
    pub members: Vec<Member>,
}

impl Layout {
    /// Whether `member` takes part in linking under this layout's mode.
    pub fn selects(&self, member: &Member) -> bool {
        match (member.role, self.mode) {
            (Role::Field | Role::Composite, _) => true,
            (Role::Base, _) => self.inherit,
            (Role::Auto, LinkMode::Automatic) => member.public,
            (Role::Auto, LinkMode::Manual) => false,
        }
    }
}

/// Strips the module path from a type name.
pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}
