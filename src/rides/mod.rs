// 行程登记模块

pub mod registrar;

pub use registrar::{
    BookRideOutcome, BookRideRequest, RideRegistrar, ShareRideOutcome, ShareRideRequest,
};
