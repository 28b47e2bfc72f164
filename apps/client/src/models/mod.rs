pub mod basket;
pub mod history;
pub mod impact;
pub mod panels;
pub mod product;
