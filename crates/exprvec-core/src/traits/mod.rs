mod store;

pub use store::{DescriptorFilter, IVectorStore};
