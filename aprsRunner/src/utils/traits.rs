// Seams between the beacon runner and its collaborators

use crate::data::state_store::StateError;
use crate::transport::error::TransportResult;

/// A session able to deliver formatted packets to the APRS network.
pub trait Transport {
    fn connect(&mut self) -> TransportResult<()>;

    fn send(&mut self, packet: &str) -> TransportResult<()>;

    /// Best-effort; never fails.
    fn close(&mut self);
}

/// Where progress along the route survives between runs.
pub trait StateStore {
    fn load(&mut self) -> Result<f64, StateError>;

    fn save(&mut self, current_distance: f64) -> Result<(), StateError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self) -> TransportResult<()> {
        (**self).connect()
    }

    fn send(&mut self, packet: &str) -> TransportResult<()> {
        (**self).send(packet)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

impl<S: StateStore + ?Sized> StateStore for Box<S> {
    fn load(&mut self) -> Result<f64, StateError> {
        (**self).load()
    }

    fn save(&mut self, current_distance: f64) -> Result<(), StateError> {
        (**self).save(current_distance)
    }
}
