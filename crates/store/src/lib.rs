//! Persistence seam for the health monitor. The monitor talks only to the
//! `CampaignRepository` trait; the shipped implementation is an in-memory
//! DashMap store whose conditional updates are atomic at map-entry
//! granularity, standing in for single conditional UPDATEs against a
//! relational store.

pub mod memory;
pub mod repository;

pub use memory::MemoryRepository;
pub use repository::CampaignRepository;
