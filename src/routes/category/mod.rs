pub mod aggregate;
mod handler;
mod model;

pub use handler::{
    create_category,
    find_by_slug,
    get_products,
    list_categories,
    list_slugs,
    update_products,
};
