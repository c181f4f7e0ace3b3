//! Handlers shared by `/api/projects` and `/api/ideas`, instantiated per content type.

pub mod collection;
pub mod comments;
pub mod item;
pub mod likes;

pub use collection::get as list_get;
pub use collection::post as list_post;

pub use item::delete as item_delete;
pub use item::get as item_get;
pub use item::put as item_put;

pub use likes::delete as like_delete;
pub use likes::post as like_post;

pub use comments::get as comments_get;
pub use comments::post as comments_post;
