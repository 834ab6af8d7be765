pub mod catalog;
pub mod library;
pub mod profile;
pub mod providers;
pub mod recommender;
