//! Unit test modules.

mod interval_parser_test;
mod physics_test;
mod route_test;
