pub mod rag;
pub mod search;
