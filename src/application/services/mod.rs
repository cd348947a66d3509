mod reference_resolver;
mod transport;

pub use reference_resolver::ReferenceResolver;
pub use transport::{BodyStream, Transport, TransportRequest, TransportResponse};
