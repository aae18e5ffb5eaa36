mod client;

pub use client::GithubMilestoneSource;
