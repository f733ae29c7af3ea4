pub mod error;
pub mod resolver;
pub mod slots;
pub mod store;
pub mod window;
