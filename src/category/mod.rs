//! Categories and subcategories: the two-level classification of transactions.

mod core;
mod create;
mod edit;
mod page;

pub use core::{
    Category, CategoryId, CategoryKind, CategoryLookup, CategoryName, Subcategory, SubcategoryId,
};
pub use create::{create_category_endpoint, create_subcategory_endpoint};
pub use edit::{rename_category_endpoint, update_subcategory_endpoint};
pub use page::get_categories_page;
