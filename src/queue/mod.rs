//! Service Bus queue publishing over the REST interface

mod sas;
mod service_bus;

pub use service_bus::ServiceBusClient;
