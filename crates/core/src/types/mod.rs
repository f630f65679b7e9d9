//! Core types for the fitsense SDK.

pub mod body_profile;
pub mod i18n;
pub mod id;
pub mod order;
pub mod product;
pub mod product_type;
pub mod recommendation;

pub use body_profile::UserBodyProfile;
pub use i18n::I18nBundle;
pub use id::{ProductId, ProductTypeId, StoreId};
pub use order::{Order, OrderItem};
pub use product::{Product, ProductMeta, ProductSize};
pub use product_type::ProductType;
pub use recommendation::{
    BodyProfileRecommendedSize, RecommendationKind, SizeComparisonRecommendedSize,
};
