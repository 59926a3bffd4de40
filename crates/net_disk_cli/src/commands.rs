//! Command modules for the net-disk CLI.
//!
//! - `auth_cmd`: token login, logout, and status
//! - `config_cmd`: configuration file management
//! - `repos_cmd`: repository list and creation
//! - `ls_cmd`: one-off folder listings
//! - `upload_cmd`: bulk upload of local files and folders
//! - `browse_cmd`: the interactive browsing session

pub mod auth_cmd;
pub mod browse_cmd;
pub mod config_cmd;
pub mod ls_cmd;
pub mod repos_cmd;
pub mod upload_cmd;
