pub mod db_utils;
pub mod reset_tokens;
pub mod username_cache;
pub mod username_filter;
