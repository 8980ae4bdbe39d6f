//! Post-processing module
//!
//! `PostProcessChain` runs ordered full-screen passes over the scene color.
//! The optional effects (`PostFeature`) are ordinary passes toggled by
//! `enabled`.

mod post_chain;

pub use post_chain::{
    PostProcessChain, PostPass, PassInput, PostReport, PostConfig, PostFeature, PostPrograms,
};
