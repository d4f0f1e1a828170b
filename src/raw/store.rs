use core::fmt::Debug;

/// The color of a red-black tree node. Nil children count as black.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Black,
}

/// The stored height of an AVL node; a leaf has height 1, nil height 0.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Height(pub(crate) i32);

/// Per-variant node annotation, and its value on a freshly built node.
///
/// A new node enters the tree as a leaf: height 1 for AVL, red for
/// red-black (red insertion preserves the black-height and lets the fixup
/// walk repair any red-red violation), nothing for the plain BST.
pub trait Augment: Copy {
    fn fresh() -> Self;
}

impl Augment for () {
    #[inline]
    fn fresh() -> Self {}
}

impl Augment for Height {
    #[inline]
    fn fresh() -> Self {
        Height(1)
    }
}

impl Augment for Color {
    #[inline]
    fn fresh() -> Self {
        Color::Red
    }
}

/// Read/write access to a tree's node records, independent of how they are
/// laid out in memory.
///
/// Every tree algorithm in this crate is written against this contract (or
/// one of the capability extensions below) and monomorphizes per store, so
/// an accessor call compiles down to a direct field access; there is no
/// dynamic dispatch on any tree operation.
///
/// A handle (`Ref`) is a small `Copy` value that either designates a live
/// node or is the distinguished [`NIL`](NodeStore::NIL) value; handle
/// equality is plain `==`. All accessors except [`is_nil`](NodeStore::is_nil)
/// require a non-nil handle and treat a nil argument as a programmer error.
pub trait NodeStore<K> {
    /// Node handle; `NIL` or a live node.
    type Ref: Copy + Eq + Debug;

    /// The "no node" handle.
    const NIL: Self::Ref;

    #[inline]
    fn is_nil(h: Self::Ref) -> bool {
        h == Self::NIL
    }

    fn left(&self, n: Self::Ref) -> Self::Ref;
    fn right(&self, n: Self::Ref) -> Self::Ref;
    fn parent(&self, n: Self::Ref) -> Self::Ref;

    fn set_left(&mut self, n: Self::Ref, child: Self::Ref);
    fn set_right(&mut self, n: Self::Ref, child: Self::Ref);
    fn set_parent(&mut self, n: Self::Ref, parent: Self::Ref);

    fn key(&self, n: Self::Ref) -> &K;

    /// Creates a detached leaf node (all links nil, fresh annotation).
    fn build(&mut self, key: K) -> Self::Ref;

    /// Releases a node that has been unlinked from the tree. Whether the
    /// storage is actually reclaimed is up to the representation.
    fn discard(&mut self, n: Self::Ref);

    /// Drops every node at once.
    fn clear(&mut self);
}

/// Height access, required by the AVL layer.
pub trait HeightStore<K>: NodeStore<K> {
    fn height(&self, n: Self::Ref) -> i32;
    fn set_height(&mut self, n: Self::Ref, height: i32);
}

/// Color access, required by the red-black layer.
pub trait ColorStore<K>: NodeStore<K> {
    fn color(&self, n: Self::Ref) -> Color;
    fn set_color(&mut self, n: Self::Ref, color: Color);
}
