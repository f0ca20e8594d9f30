//! # Attack Simulations
//!
//! Each test plays a validator or outsider trying to break safety or keep
//! stake it should lose.

pub mod forgery;
pub mod slashing;
