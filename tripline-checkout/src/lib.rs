pub mod models;
pub mod orchestrator;
pub mod selection;
pub mod session;
pub mod sources;

pub use models::{AttemptStatus, BookingAttempt};
pub use orchestrator::BookingOrchestrator;
pub use selection::{Selection, MAX_ADDON_QUANTITY};
pub use session::{CheckoutSession, SessionError, SessionStep};
pub use sources::ContextLoader;
