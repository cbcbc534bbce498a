mod analytics_tests;
mod auth_tests;
mod db_tests;
mod website_tests;
