//! Errors raised while emitting geometry.

use thiserror::Error;

use crate::geometry::GeometryKind;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A fixed-capacity geometry buffer would overflow.
    #[error("{kind} buffer capacity exceeded: {requested} requested, capacity {capacity}")]
    CapacityExceeded {
        kind: GeometryKind,
        requested: usize,
        capacity: usize,
    },

    /// Quad geometry must come in groups of four vertices.
    #[error("quad vertex count {0} is not a multiple of 4")]
    UnalignedQuadVertices(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
