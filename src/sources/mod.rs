//! Built-in provider adapters.

mod oculus;
mod proxymesh;
mod static_list;

pub use oculus::{OculusConfig, OculusSource};
pub use proxymesh::ProxyMeshSource;
pub use static_list::StaticListSource;
