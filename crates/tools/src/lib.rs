pub mod environment;
pub mod executor;
pub mod invocation;
pub mod runner;

pub use environment::{ActivationStrategy, EnvironmentContext};
pub use executor::{ExecError, ProcessExecutor};
pub use invocation::Invocation;
pub use runner::{ExecutionOutcome, ShellRunner};
