//! Tag mutation protocol: batch actions and their orchestration

mod action;
mod protocol;

pub use action::{ActionRequest, TagAction};
pub use protocol::MutationProtocol;
