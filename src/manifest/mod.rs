//! Manifest language: file modes, directives, repository lists and the
//! recursive walker that ties them together.
pub mod directive;
pub mod mode;
pub mod packages;
pub mod repo_list;
pub mod walker;

pub use directive::Directive;
pub use mode::FileMode;
pub use packages::PackageSet;
pub use repo_list::RepoEntry;
pub use walker::Walker;
