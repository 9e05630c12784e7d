//! Filesystem object store confined to a capability directory.

mod object_store;

pub use object_store::FsObjectStore;
