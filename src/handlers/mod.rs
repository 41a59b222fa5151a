pub mod api;
pub mod credentials;
pub mod history;
pub mod session;
pub mod speak;
pub mod voices;
