mod handler;
mod model;

pub use handler::create_price;
