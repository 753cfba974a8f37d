//! Request and Response models for the demo API and admin surface
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{CreateItemRequest, UpdateItemRequest};
pub use responses::{
    DashboardSummary, HealthResponse, Item, ItemListResponse, MessageResponse, ResetResponse,
    StatsResponse,
};
