mod quote;

pub use quote::{PriceRequest, Quote};
