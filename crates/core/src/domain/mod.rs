pub mod catalog;
pub mod customer;
pub mod discount;
pub mod money;
pub mod product;
