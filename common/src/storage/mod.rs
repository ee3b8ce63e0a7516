pub mod knowledge_store;
pub mod types;
