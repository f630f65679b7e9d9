//! Wire DTOs for the recommendation service and their conversions
//! into core domain types.
//!
//! Only responses whose wire shape differs from the core model get a
//! DTO here; responses that match the domain types byte-for-byte
//! (product types, body profiles, localization bundles) deserialize
//! into `fitsense-core` types directly.

use std::collections::BTreeMap;

use fitsense_core::{
    BodyProfileRecommendedSize, Product, ProductId, ProductMeta, ProductSize, ProductType,
    ProductTypeId, StoreId, UserBodyProfile,
};
use serde::{Deserialize, Serialize};

use super::{ProductCheck, StoreInfo};
use crate::session::SessionData;

/// Response of the product validity check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductCheckDto {
    pub name: Option<String>,
    pub product_id: Option<i64>,
    pub store_id: Option<i64>,
    #[serde(default)]
    pub data: ProductCheckDataDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductCheckDataDto {
    #[serde(default)]
    pub valid_product: bool,
    #[serde(default)]
    pub fetch_meta_data: bool,
}

impl ProductCheckDto {
    pub(crate) fn into_check(self, external_id: &str) -> ProductCheck {
        ProductCheck {
            external_id: external_id.to_string(),
            valid: self.data.valid_product,
            product_id: self.product_id.map(ProductId::new),
            store_id: self.store_id.map(StoreId::new),
            name: self.name,
            fetch_meta_data: self.data.fetch_meta_data,
        }
    }
}

/// A store or user product as served by the product endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductDto {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    pub name: String,
    pub product_type: i64,
    #[serde(default)]
    pub sizes: Vec<SizeDto>,
    #[serde(default)]
    pub store_id: Option<i64>,
    #[serde(default)]
    pub meta: Option<ProductMetaDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SizeDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub measurements: BTreeMap<String, Option<i32>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductMetaDto {
    pub brand: Option<String>,
    pub gender: Option<String>,
    pub fit: Option<String>,
    pub style: Option<String>,
    #[serde(default)]
    pub model_measurements: BTreeMap<String, Option<i32>>,
    pub brand_sizing: Option<String>,
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        Self {
            external_id: dto.external_id.unwrap_or_default(),
            id: ProductId::new(dto.id),
            name: dto.name,
            product_type_id: Some(ProductTypeId::new(dto.product_type)),
            sizes: dto.sizes.into_iter().map(ProductSize::from).collect(),
            store_id: dto.store_id.map(StoreId::new),
            meta: dto.meta.map(ProductMeta::from),
        }
    }
}

impl From<SizeDto> for ProductSize {
    fn from(dto: SizeDto) -> Self {
        Self {
            name: dto.name,
            measurements: dto.measurements,
        }
    }
}

impl From<ProductMetaDto> for ProductMeta {
    fn from(dto: ProductMetaDto) -> Self {
        Self {
            brand: dto.brand,
            gender: dto.gender,
            fit: dto.fit,
            style: dto.style,
            model_measurements: dto.model_measurements,
            brand_sizing: dto.brand_sizing,
        }
    }
}

/// Response of the session endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionDto {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUserDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionUserDto {
    #[serde(default)]
    pub body_measurement: bool,
}

impl From<SessionDto> for SessionData {
    fn from(dto: SessionDto) -> Self {
        Self {
            access_token: dto.access_token,
            auth_token: dto.auth_token.filter(|token| !token.is_empty()),
            has_body_profile: dto.user.is_some_and(|user| user.body_measurement),
        }
    }
}

/// Response of the store-info endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoreInfoDto {
    pub short_name: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl From<StoreInfoDto> for StoreInfo {
    fn from(dto: StoreInfoDto) -> Self {
        Self {
            short_name: dto.short_name,
            region: dto.region,
        }
    }
}

/// Response of the body-profile recommendation endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BodyRecommendationDto {
    pub size_name: String,
}

impl From<BodyRecommendationDto> for BodyProfileRecommendedSize {
    fn from(dto: BodyRecommendationDto) -> Self {
        Self {
            size_name: dto.size_name,
        }
    }
}

/// Request body for the body-profile recommendation endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BodyRecommendationRequest<'a> {
    pub user_gender: Option<&'a str>,
    pub user_age: Option<i32>,
    pub user_height: Option<i32>,
    pub user_weight: Option<&'a str>,
    pub body_data: &'a BTreeMap<String, Option<i32>>,
    pub product_id: i64,
    pub sizes: Vec<BodyRecommendationSize<'a>>,
    pub product_types: &'a [ProductType],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BodyRecommendationSize<'a> {
    pub name: Option<&'a str>,
    pub measurements: &'a BTreeMap<String, Option<i32>>,
}

impl<'a> BodyRecommendationRequest<'a> {
    pub(crate) fn new(
        product_types: &'a [ProductType],
        product: &'a Product,
        profile: &'a UserBodyProfile,
    ) -> Self {
        Self {
            user_gender: profile.gender.as_deref(),
            user_age: profile.age,
            user_height: profile.height,
            user_weight: profile.weight.as_deref(),
            body_data: &profile.body_data,
            product_id: product.id.as_i64(),
            sizes: product
                .sizes
                .iter()
                .map(|size| BodyRecommendationSize {
                    name: size.name.as_deref(),
                    measurements: &size.measurements,
                })
                .collect(),
            product_types,
        }
    }
}
