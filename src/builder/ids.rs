//! Typed indices for the arenas used by the builder and its graphs.

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index as u32)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(id: $name) -> usize {
                id.index()
            }
        }
    };
}

id_type!(
    /// A snapping site, numbered in selection order.
    SiteId
);
id_type!(
    /// A vertex of one layer's output graph.
    VertexId
);
id_type!(
    /// An edge of one layer's output graph.
    EdgeId
);
id_type!(
    /// An edge as submitted to the builder, numbered across all layers.
    InputEdgeId
);
id_type!(
    /// A vertex as submitted to the builder.
    InputVertexId
);

/// Graph edge as `(source, destination)`.
pub type Edge = (VertexId, VertexId);

/// A client-supplied edge label.
pub type Label = u32;

#[inline]
pub(crate) fn reverse(e: Edge) -> Edge {
    (e.1, e.0)
}
