//! Loader and writer collaborators around the merge engine: find and unwrap
//! canonical documents, shape and write merged output.

pub mod load;
pub mod present;
pub mod write;
