pub mod avatar_service;
pub mod content_service;
pub mod profile_service;
pub mod resource_service;
