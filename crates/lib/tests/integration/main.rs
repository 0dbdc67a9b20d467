//! Library integration tests: building, rendering and re-reading projects.

mod common;
mod end_to_end_tests;
mod external_dependency_tests;
