pub mod github;
pub mod mock;
pub mod store;

pub use github::GithubMilestoneSource;
pub use mock::MockSource;
pub use store::JsonFileStore;
