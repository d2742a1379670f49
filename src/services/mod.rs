// Reference data
pub mod catalog;
pub mod customers;
pub mod suppliers;

// Goods-in and quality control
pub mod goods_in;
pub mod purchases;
pub mod qc;

// Goods-out
pub mod sales_orders;

// Accounts
pub mod users;

// Shared helpers
pub mod audit;
pub mod filters;
