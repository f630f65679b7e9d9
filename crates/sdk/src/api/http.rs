//! HTTP implementation of the remote data gateway.
//!
//! A thin JSON client over `reqwest`: the API key goes out as a
//! default header installed at construction, every response body is
//! read as text first so decode failures can log the offending
//! payload, and 404/403 are mapped to their dedicated error variants
//! before any parsing happens.

use std::any::type_name;

use async_trait::async_trait;
use fitsense_core::{
    BodyProfileRecommendedSize, I18nBundle, Order, Product, ProductId, ProductType, UserBodyProfile,
};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::types::{
    BodyRecommendationDto, BodyRecommendationRequest, ProductCheckDto, ProductDto, SessionDto,
    StoreInfoDto,
};
use super::{Gateway, GatewayError, ProductCheck, StoreInfo};
use crate::config::WidgetConfig;
use crate::session::SessionData;

/// Header carrying the store API key on every request.
const API_KEY_HEADER: &str = "x-fs-api-key";

/// Header carrying the browser id on session requests.
const BROWSER_ID_HEADER: &str = "x-fs-bid";

/// Production gateway over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for the configured service deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(config: &WidgetConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(&config.api_key)
                .map_err(|e| GatewayError::InvalidApiKey(e.to_string()))?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.env.base_url(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Read the body as text, map 404/403 and non-success statuses,
    /// then decode.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        resource: &str,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(resource.to_string()));
        }
        if status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Forbidden(resource.to_string()));
        }
        if !status.is_success() {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&text).map_err(|source| {
            tracing::error!(
                resource,
                body = %text.chars().take(500).collect::<String>(),
                "failed to decode service response"
            );
            GatewayError::Decode {
                type_name: type_name::<T>(),
                source,
            }
        })
    }

    /// Like [`Self::decode`] but for endpoints that only acknowledge.
    async fn ack(response: reqwest::Response, resource: &str) -> Result<(), GatewayError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(resource.to_string()));
        }
        if status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Forbidden(resource.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(skip(self), fields(external_id = %external_id))]
    async fn check_product(&self, external_id: &str) -> Result<ProductCheck, GatewayError> {
        let response = self
            .client
            .get(self.url("/product/check"))
            .query(&[("external-id", external_id)])
            .send()
            .await?;
        let dto: ProductCheckDto = Self::decode(response, "product check").await?;
        Ok(dto.into_check(external_id))
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn store_product(&self, id: ProductId) -> Result<Product, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/store-products/{id}")))
            .send()
            .await?;
        let dto: ProductDto = Self::decode(response, "store product").await?;
        Ok(dto.into())
    }

    #[instrument(skip(self))]
    async fn product_types(&self) -> Result<Vec<ProductType>, GatewayError> {
        let response = self.client.get(self.url("/product-types")).send().await?;
        Self::decode(response, "product types").await
    }

    #[instrument(skip(self, auth_token))]
    async fn user_products(&self, auth_token: &str) -> Result<Vec<Product>, GatewayError> {
        let response = self
            .client
            .get(self.url("/user-products"))
            .bearer_auth(auth_token)
            .send()
            .await?;
        let dtos: Vec<ProductDto> = Self::decode(response, "user products").await?;
        Ok(dtos.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self, auth_token))]
    async fn user_body_profile(
        &self,
        auth_token: &str,
    ) -> Result<UserBodyProfile, GatewayError> {
        let response = self
            .client
            .get(self.url("/user-body-measurements"))
            .bearer_auth(auth_token)
            .send()
            .await?;
        Self::decode(response, "user body profile").await
    }

    #[instrument(skip(self, product_types, product, profile), fields(product_id = %product.id))]
    async fn body_recommended_size(
        &self,
        product_types: &[ProductType],
        product: &Product,
        profile: &UserBodyProfile,
        footwear: bool,
    ) -> Result<BodyProfileRecommendedSize, GatewayError> {
        let path = if footwear {
            "/shoe-size-recommendations"
        } else {
            "/size-recommendations"
        };
        let request = BodyRecommendationRequest::new(product_types, product, profile);
        let response = self
            .client
            .post(self.url(path))
            .json(&request)
            .send()
            .await?;
        let dtos: Vec<BodyRecommendationDto> =
            Self::decode(response, "body size recommendation").await?;
        dtos.into_iter()
            .next()
            .map(BodyProfileRecommendedSize::from)
            .ok_or_else(|| GatewayError::NotFound("body size recommendation".to_string()))
    }

    #[instrument(skip(self, browser_id))]
    async fn session(&self, browser_id: &str) -> Result<SessionData, GatewayError> {
        let response = self
            .client
            .post(self.url("/sessions"))
            .header(BROWSER_ID_HEADER, browser_id)
            .send()
            .await?;
        let dto: SessionDto = Self::decode(response, "session").await?;
        Ok(dto.into())
    }

    #[instrument(skip(self))]
    async fn i18n(&self, language: &str) -> Result<I18nBundle, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/i18n/{language}")))
            .send()
            .await?;
        Self::decode(response, "shared localization").await
    }

    #[instrument(skip(self), fields(store = %store_name))]
    async fn store_i18n(
        &self,
        store_name: &str,
        language: &str,
    ) -> Result<I18nBundle, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/stores/{store_name}/i18n/{language}")))
            .send()
            .await?;
        Self::decode(response, "store localization").await
    }

    #[instrument(skip(self, order), fields(order_id = %order.external_order_id))]
    async fn send_order(&self, order: &Order) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url("/orders"))
            .json(order)
            .send()
            .await?;
        Self::ack(response, "order").await
    }

    #[instrument(skip(self))]
    async fn store_info(&self) -> Result<StoreInfo, GatewayError> {
        let response = self.client.get(self.url("/store-info")).send().await?;
        let dto: StoreInfoDto = Self::decode(response, "store info").await?;
        Ok(dto.into())
    }

    #[instrument(skip(self, payload))]
    async fn send_event(
        &self,
        name: &str,
        payload: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        let body = serde_json::json!({"name": name, "data": payload});
        let response = self
            .client
            .post(self.url("/events"))
            .json(&body)
            .send()
            .await?;
        Self::ack(response, "event").await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn send_product_image(&self, product: &Product) -> Result<(), GatewayError> {
        let body = serde_json::json!({
            "externalId": product.external_id,
            "productId": product.id,
            "storeId": product.store_id,
        });
        let response = self
            .client
            .post(self.url("/product-images"))
            .json(&body)
            .send()
            .await?;
        Self::ack(response, "product image").await
    }

    #[instrument(skip(self, auth_token))]
    async fn delete_user_data(&self, auth_token: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url("/user-data"))
            .bearer_auth(auth_token)
            .send()
            .await?;
        Self::ack(response, "user data deletion").await
    }
}
