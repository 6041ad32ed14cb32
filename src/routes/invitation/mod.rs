mod handler;
mod model;

pub use handler::available_actions;
pub use model::{InvitationActionsRequest, InvitationActionsView};
