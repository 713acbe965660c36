pub mod credentials;
pub mod notification;
pub mod order;
pub mod response;
