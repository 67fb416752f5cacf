pub mod address;
pub mod comment;
pub mod enums;
pub mod like;
pub mod message;
pub mod post;
pub mod role;
pub mod user;
