//! Table queries against `rest/v1`.
//!
//! Filters use the `PostgREST` operator syntax (`id=eq.<value>`). Every call
//! is sent with the user's bearer token.

use stockroom_core::{
    AccessToken, Product, ProductId, ProductInput, Profile, ProfileId, QueryService,
};
use tracing::{debug, instrument};
use url::Url;

use super::{SupabaseClient, SupabaseError};

const PERSONS: &str = "persons";
const PRODUCTS: &str = "products";

impl SupabaseClient {
    fn table_url(&self, table: &str) -> Result<Url, SupabaseError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    fn authorized(
        &self,
        method: reqwest::Method,
        url: Url,
        token: &AccessToken,
    ) -> reqwest::RequestBuilder {
        self.http().request(method, url).bearer_auth(token.expose())
    }
}

/// `products?id=eq.<id>`
fn product_row_url(mut url: Url, id: ProductId) -> Url {
    url.query_pairs_mut()
        .append_pair("id", &format!("eq.{id}"));
    url
}

impl QueryService for SupabaseClient {
    type Error = SupabaseError;

    #[instrument(skip(self, token), fields(user_id = %id))]
    async fn fetch_profile(
        &self,
        token: &AccessToken,
        id: ProfileId,
    ) -> Result<Option<Profile>, SupabaseError> {
        let mut url = self.table_url(PERSONS)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("limit", "2");

        let response = self
            .authorized(reqwest::Method::GET, url, token)
            .send()
            .await?;
        let mut rows: Vec<Profile> = Self::handle_response(response).await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            count => Err(SupabaseError::MultipleRows {
                table: PERSONS,
                count,
            }),
        }
    }

    #[instrument(skip_all)]
    async fn list_products(&self, token: &AccessToken) -> Result<Vec<Product>, SupabaseError> {
        let mut url = self.table_url(PRODUCTS)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");

        let response = self
            .authorized(reqwest::Method::GET, url, token)
            .send()
            .await?;
        let products: Vec<Product> = Self::handle_response(response).await?;

        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self, token, input), fields(name = %input.name))]
    async fn insert_product(
        &self,
        token: &AccessToken,
        input: &ProductInput,
    ) -> Result<(), SupabaseError> {
        let url = self.table_url(PRODUCTS)?;

        let response = self
            .authorized(reqwest::Method::POST, url, token)
            .header("Prefer", "return=minimal")
            .json(&[input])
            .send()
            .await?;

        Self::expect_success(response).await
    }

    #[instrument(skip(self, token, input), fields(product_id = %id))]
    async fn update_product(
        &self,
        token: &AccessToken,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), SupabaseError> {
        let url = product_row_url(self.table_url(PRODUCTS)?, id);

        let response = self
            .authorized(reqwest::Method::PATCH, url, token)
            .header("Prefer", "return=minimal")
            .json(input)
            .send()
            .await?;

        Self::expect_success(response).await
    }

    #[instrument(skip(self, token), fields(product_id = %id))]
    async fn delete_product(&self, token: &AccessToken, id: ProductId) -> Result<(), SupabaseError> {
        let url = product_row_url(self.table_url(PRODUCTS)?, id);

        let response = self
            .authorized(reqwest::Method::DELETE, url, token)
            .send()
            .await?;

        Self::expect_success(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::SupabaseConfig;

    fn client() -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: Url::parse("https://abc.supabase.co/").unwrap(),
            anon_key: SecretString::from("anon".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn test_product_row_filter() {
        let url = product_row_url(client().table_url(PRODUCTS).unwrap(), ProductId::new(42));
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/rest/v1/products?id=eq.42"
        );
    }

    #[test]
    fn test_authorized_request_carries_bearer() {
        let client = client();
        let request = client
            .authorized(
                reqwest::Method::GET,
                client.table_url(PRODUCTS).unwrap(),
                &AccessToken::new("user-jwt".to_string()),
            )
            .build()
            .unwrap();

        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Bearer user-jwt"
        );
    }

    #[test]
    fn test_profile_rows_parse() {
        let rows: Vec<Profile> = serde_json::from_str(
            r#"[{"id":"0b3c9f3e-8f0a-4e59-9d2c-6f1f6b8a7c11","username":"budi","role":"admin","created_at":"2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username.as_deref(), Some("budi"));
    }
}
