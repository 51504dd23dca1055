// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    age_from_bdate, profile_url, Candidate, FavoriteEntry, PhotoRef, Sex,
    UserInfo, UserProfile, MAX_AGE, MIN_AGE,
};
pub use requests::{CallbackEvent, InboundMessage};
pub use responses::{ErrorResponse, HealthResponse, OutboundMessage};
