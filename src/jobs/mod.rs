pub mod reset_token_cleanup;
