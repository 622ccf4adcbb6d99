// Adapters layer: concrete implementations for external systems (registry http, storage).

pub mod http;
pub mod storage;
