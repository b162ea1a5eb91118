//! Orders, their settlement status and the order-line grammar.

mod input;
mod record;
mod side;
mod status;

pub use input::{OrderInput, parse_order_input};
pub use record::{Order, OrderRequest};
pub use side::OrderSide;
pub use status::OrderStatus;
