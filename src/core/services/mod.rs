pub mod filter_builder;
pub mod key_list_controller;
pub mod list_state;
pub mod pager;
