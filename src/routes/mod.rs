pub mod invitation;
pub mod system;
