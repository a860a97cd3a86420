//! tubevault - video channel metadata harvesting and reporting.
//!
//! Pulls channel, video, playlist and comment metadata from the YouTube Data
//! API into a relational store and answers a fixed set of reporting questions
//! over the stored videos.

pub mod api;
pub mod cli;
pub mod collector;
pub mod config;
pub mod harvest;
pub mod mapper;
pub mod models;
pub mod reports;
pub mod repository;
pub mod schema;
