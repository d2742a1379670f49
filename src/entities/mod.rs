//! Database entities
//!
//! Purchase orders and sales orders have header rows whose ids are the
//! shared order ids; every order-level view is still derived from the line
//! tables.

pub mod category;
pub mod customer;
pub mod device;
pub mod log_entry;
pub mod purchase_line;
pub mod purchase_order;
pub mod qc_record;
pub mod sales_order;
pub mod sales_order_line;
pub mod supplier;
pub mod tac_code;
pub mod tray;
pub mod user;
