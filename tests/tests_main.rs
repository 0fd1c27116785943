#[path = "helpers/mod.rs"]
mod helpers;

#[path = "linking/mod.rs"]
mod linking;
