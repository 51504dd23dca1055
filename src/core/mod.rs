// Dialogue core exports
pub mod commands;
pub mod inbox;
pub mod keyboards;
pub mod replies;
pub mod router;
pub mod session;
pub mod settings_input;

pub use commands::{normalize, Command};
pub use inbox::Inbox;
pub use keyboards::Keyboard;
pub use router::{Collaborators, Consumption, DialogueRouter};
pub use session::{Browser, Mode, Position, Session, SessionGuard, SessionStore};
pub use settings_input::{validate, InputError, SettingValue, Validation};
