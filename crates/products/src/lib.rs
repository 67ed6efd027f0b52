//! Product registry domain module.
//!
//! Pure validation rules for products and categories (no IO, no storage).

pub mod category;
pub mod product;

pub use category::Category;
pub use product::{NewProduct, Price, Product};
