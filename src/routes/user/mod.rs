mod handler;
mod model;

pub use handler::{add_favorite, check_token, login, me, remove_favorite};
