//! Income and expense categories.

mod core;
mod endpoints;

pub use core::{
    Category, CategoryEdit, CategoryId, CategoryType, NewCategory, count_categories,
    create_category, create_category_table, delete_category, get_category, list_categories,
    update_category,
};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, edit_category_endpoint,
    get_category_endpoint, list_categories_endpoint,
};
