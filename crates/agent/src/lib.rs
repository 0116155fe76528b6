pub mod message;
pub mod model;
pub mod orchestrator;
pub mod session;

pub use message::{Message, Role};
pub use model::{AgentModel, ReplayModel, ReplayResponse};
pub use orchestrator::{CommandRun, Orchestrator, TurnReport};
pub use session::{Session, StopReason, Transcript};
