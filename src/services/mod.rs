// Service exports
pub mod gateway;
pub mod postgres;
pub mod vk;

pub use gateway::{
    CollaboratorError, CollaboratorResult, FavoritesGateway, PhotoService, ProfileGateway,
    SearchService, Transport, UserDirectory,
};
pub use postgres::{PostgresClient, PostgresError};
pub use vk::{VkClient, VkError, VkSearch};
