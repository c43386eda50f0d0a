mod component;
mod registry;
mod shutdown;
pub mod signal;

pub use component::{Reporter, Schedulable};
pub use registry::SchedulableSet;
pub use shutdown::{ShutdownCoordinator, ShutdownCoordinatorBuilder, ShutdownPhase};
