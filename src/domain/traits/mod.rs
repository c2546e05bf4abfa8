//! Domain traits - Abstractions for external collaborators

pub mod transport;
pub mod store;

pub use transport::{ActionTarget, Transport, TransportEvent};
pub use store::{Document, Filter, Query, SortOrder, Store, ID_FIELD, OWNER_FIELD, VALUE_FIELD};
