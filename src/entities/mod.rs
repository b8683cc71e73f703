pub mod cache_entry;
pub mod movie;
pub mod movie_image;
pub mod movie_writer;
pub mod person;
pub mod role;
pub mod user;
pub mod vote;
