pub mod openhouse;

pub use openhouse::{
    ApiError, HttpOpenhouseApi, NewRegistrant, OpenhouseApi, PhoneLookup, QrLookup,
};
