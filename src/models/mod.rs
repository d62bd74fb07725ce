//! Typed schemas for the Graph, management and token endpoints

mod directory;
mod odata;
mod subscription;
mod token;

pub use directory::GroupMember;
pub use odata::ODataPage;
pub use subscription::{QueueMessage, Subscription, SubscriptionFilter};
pub use token::TokenResponse;
