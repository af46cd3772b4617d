pub mod reference;
pub mod store;

pub use reference::{DocumentRef, Namespace};
pub use store::PageStore;
