//! Services shared by controllers, middleware and handlers.

pub mod cached_setting_store;
pub mod meta_service;
pub mod page_cache;

pub use cached_setting_store::CachedSettingStore;
pub use meta_service::MetaStore;
pub use page_cache::{CachedPage, PageCache};
