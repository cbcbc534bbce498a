pub mod error_management;
