pub mod model;
pub mod permissions;

pub use model::{DEFAULT_EXPIRATION_DAYS, Invitation, InvitationError, InvitationStatus};
pub use permissions::{InvitationActions, available_actions, available_actions_at};
