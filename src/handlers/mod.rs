pub mod content;
pub mod profiles;
pub mod resources;
pub mod system;
pub mod users;
