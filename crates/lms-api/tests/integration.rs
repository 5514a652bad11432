mod common;

mod catalog_tests;
mod learning_tests;
mod router_tests;
