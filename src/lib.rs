pub mod cli;
pub mod db;
pub mod error;
pub mod history;
pub mod model;
pub mod ops;
pub mod output;
pub mod render;
pub mod validate;
pub mod web;
