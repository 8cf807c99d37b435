//! Configuration module

mod site;

pub use site::ContentConfig;
pub use site::ContentSourceKind;
pub use site::PlatformKind;
pub use site::PreferenceConfig;
pub use site::SidebarConfig;
pub use site::SiteConfig;
pub use site::StorageKind;
