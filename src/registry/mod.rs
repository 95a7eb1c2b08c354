pub mod registry;

pub use registry::RegistryState;
pub use registry::RequestRegistry;
