//! Building blocks shared by the codec

pub mod code_tree;
pub mod bit_channel;
