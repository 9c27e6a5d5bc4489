pub mod registrar;
pub mod registry;
pub mod storage;
