mod handler;
mod model;

pub use handler::{create_product, find_by_slug};
