//! Uploaded-content and organization trees
//!
//! Item/Node types, the content hasher used for edit detection, the folder
//! scanner that fills managed storage, and the display-tree codec.

pub mod codec;
pub mod hasher;
pub mod node;
pub mod path;
pub mod scanner;
