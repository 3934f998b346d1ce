//! Request identity. Authentication happens upstream; this crate only reads the
//! seller identity the auth layer forwards.

pub mod seller;

pub use seller::{SellerContext, SELLER_ID_HEADER};
