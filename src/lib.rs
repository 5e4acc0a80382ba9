pub mod compare;
pub mod config;
pub mod version;

pub use compare::compare_versions;
pub use config::{ConfigScanner, PvSelection};
pub use version::{
    NativeVersionReader, StaticVersionReader, VersionInfo, VersionResourceReader,
    read_dll_version,
};
