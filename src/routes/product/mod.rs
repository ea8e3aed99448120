mod handler;
mod model;

pub use handler::{create_product, delete_product, get_product, list_by_section, list_products};
