//! Subject (user) state touched by job completions.

pub mod model;

pub use model::{
    AssetStatus, DeliveryStatus, EmailDelivery, MediaAsset, SubjectRecord, SubjectUpdate,
    VerificationStatus,
};
