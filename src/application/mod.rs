//! Application layer orchestrating the order lifecycle.
//!
//! `OrderEngine` is the single entry point for every order mutation. Each
//! operation is an atomic read-modify-write against one order record,
//! backed by the store's compare-and-swap.

pub mod engine;
