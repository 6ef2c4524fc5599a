// src/blockchain/mod.rs

pub mod abi;
pub mod nonce_manager;
pub mod rpc;
pub mod transactions;
