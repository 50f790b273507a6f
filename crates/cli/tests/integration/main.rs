mod common;

mod resolve_tests;
mod store_tests;
