mod common;
mod search;
mod service;
