use ethers::types::{Address, U256};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{u256_from_hex, HolderRecord};
use crate::constants::NODEREAL_PAGE_SIZE;
use crate::error::{Result, ToolError};
use crate::pagination::{Page, PageSource};

/// `nr_getTokenHolders` on a Nodereal endpoint.
pub struct NoderealHolders {
    client: Client,
    url: String,
    token_address: String,
    page_size: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<HoldersResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldersResult {
    #[serde(default)]
    page_key: String,
    #[serde(default)]
    details: Vec<Balance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Balance {
    account_address: String,
    #[serde(deserialize_with = "u256_from_hex")]
    token_balance: U256,
}

impl NoderealHolders {
    pub fn new(url: impl Into<String>, token_address: Address) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            token_address: format!("{token_address:?}"),
            page_size: NODEREAL_PAGE_SIZE.to_string(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = format!("{:#x}", page_size);
        self
    }

    pub fn request_body(&self, page_key: &str) -> serde_json::Value {
        json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "nr_getTokenHolders",
            "params": [self.token_address, self.page_size, page_key],
        })
    }
}

impl PageSource for NoderealHolders {
    type Cursor = String;
    type Item = HolderRecord;

    async fn request(&self, cursor: Option<&String>) -> Result<String> {
        let page_key = cursor.map(String::as_str).unwrap_or("");
        let body = self
            .client
            .post(&self.url)
            .json(&self.request_body(page_key))
            .send()
            .await?
            .text()
            .await?;
        Ok(body)
    }

    fn parse(&self, body: &str) -> Result<Page<HolderRecord, String>> {
        let resp: RpcResponse = serde_json::from_str(body)?;
        if let Some(err) = resp.error {
            return Err(ToolError::Decode(format!("rpc error {}: {}", err.code, err.message)));
        }
        let result = resp
            .result
            .ok_or_else(|| ToolError::Decode("response has neither result nor error".into()))?;

        let items = result
            .details
            .into_iter()
            .map(|b| HolderRecord {
                address: b.account_address,
                balance: b.token_balance.to_string(),
            })
            .collect();
        let next = Some(result.page_key).filter(|k| !k.is_empty());
        Ok(Page { items, next })
    }
}
