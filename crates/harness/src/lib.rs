mod bench;
mod bus;
mod provider;
mod recorder;
mod workspace;

pub use bench::{TestBench, flagged, rename};
pub use bus::OperationBus;
pub use provider::TestProvider;
pub use recorder::EventRecorder;
pub use workspace::TestWorkspace;
