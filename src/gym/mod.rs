//! Thin wrappers around external simulators.

pub mod cart_pole;

pub use cart_pole::{CPAction, CartPole};
