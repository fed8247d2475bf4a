//! Emergency Prediction Dashboard Library
//!
//! Client side of the emergency prediction service: types the prediction
//! form, calls the prediction API with the anti-forgery token attached, and
//! renders the result card.
//!
//! # Modules
//!
//! - `api`: HTTP surface of the dashboard service.
//! - `core`: Form typing, rendering and the submit controller.
//! - `integrations`: Prediction server client and token handling.
//! - `api_client`: JSON client for the prediction server.
//! - `config`: Configuration management.
//! - `controller`: Submit state machine.
//! - `csrf`: Anti-forgery cookie parsing.
//! - `display`: Icons, colours, dates and escaping.
//! - `errors`: Error handling types.
//! - `form`: Form field typing.
//! - `handlers`: HTTP request handlers.
//! - `models`: Request and response models.
//! - `notifications`: Auto-dismissing notifications.
//! - `openapi`: OpenAPI document.
//! - `routes`: Router and middleware stack.
//! - `view`: Result card view-model and rendering.

pub mod api;
pub mod core;
pub mod integrations;

pub mod api_client;
pub mod config;
pub mod controller;
pub mod csrf;
pub mod display;
pub mod errors;
pub mod form;
pub mod handlers;
pub mod models;
pub mod notifications;
pub mod openapi;
pub mod routes;
pub mod view;
