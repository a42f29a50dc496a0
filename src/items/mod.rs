// Lost and found reports
//
// The store only records reports and their statuses; every status change
// driven by matching goes through the workflow coordinator.

pub mod store;
pub mod types;

pub use store::ItemStore;
pub use types::{
    FoundItem, FoundItemId, FoundStatus, LostItem, LostItemId, LostStatus, NewFoundItem,
    NewLostItem,
};
