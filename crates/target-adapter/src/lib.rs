//! Remote target environment boundary.
//!
//! This crate exposes the capability set the action engine drives: page
//! navigation, element interaction, scrolling, tab management and content
//! extraction. Higher layers treat the adapter as opaque; any operation may
//! fail and is caught at the action-handler boundary. The `stub` feature
//! ships an in-memory backend used by tests and the demo CLI.

pub mod adapter;
pub mod errors;
pub mod model;

#[cfg(feature = "stub")]
pub mod stub;

pub use adapter::TargetAdapter;
pub use errors::TargetError;
pub use model::{
    BoundingBox, ComputedStyle, DropdownOption, ElementNode, PageDirection, PageInfo, PageState,
    TabInfo,
};

#[cfg(feature = "stub")]
pub use stub::{StubPage, StubTarget};
