mod error;
mod observer;
mod topocentric;

pub use error::GeometryError;
pub use observer::ObserverLocation;
pub use topocentric::{observe, ObservationAngles, StateVector};
