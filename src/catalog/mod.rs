//! Static reference data: health conditions, follow-up schemas, and products

mod condition;
mod product;
pub mod loader;

pub use condition::{
    ConditionCatalog, ConditionCategory, FollowUpQuestion, HealthCondition, QuestionKind,
};
pub use product::{ProductInfo, ProductType};
