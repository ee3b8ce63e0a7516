pub mod knowledge_entry;
