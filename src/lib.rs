pub mod access;
pub mod accounts;
pub mod activities;
pub mod api_router;
pub mod campaigns;
pub mod comments;
pub mod config;
pub mod contacts;
pub mod leads;
pub mod opportunities;
pub mod shared;
pub mod tasks;
pub mod users;
