//! Core library for yt-playlist-builder
pub mod api;
pub mod builder;
pub mod classify;
pub mod config;
pub mod credential;
pub mod db;
pub mod job;
pub mod models;
pub mod pacing;
