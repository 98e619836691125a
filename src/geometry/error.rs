use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: observer and object coincide")]
    DegenerateGeometry,
}
