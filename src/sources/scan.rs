use ethers::types::Address;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use url::Url;

use super::HolderRecord;
use crate::error::{Result, ToolError};
use crate::pagination::{Page, PageSource};

/// `next_page_params` flattened into query pairs.
pub type QueryCursor = Vec<(String, String)>;

/// A Blockscout-style `/api/v2` list endpoint.
pub struct ExplorerSource<T> {
    client: Client,
    url: Url,
    _item: PhantomData<T>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ListResponse<T> {
    #[serde(default)]
    items: Vec<T>,
    #[serde(default)]
    next_page_params: Option<BTreeMap<String, Box<RawValue>>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AddressRef {
    pub hash: String,
}

/// `value` is passed through exactly as the explorer reports it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HolderItem {
    pub address: AddressRef,
    pub value: String,
}

impl From<HolderItem> for HolderRecord {
    fn from(item: HolderItem) -> Self {
        HolderRecord {
            address: item.address.hash,
            balance: item.value,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeeValue {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TransactionItem {
    pub hash: String,
    pub gas_used: String,
    pub gas_price: String,
    pub fee: FeeValue,
}

impl<T> ExplorerSource<T> {
    pub fn new(url: Url) -> Self {
        Self {
            client: Client::new(),
            url,
            _item: PhantomData,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), path);
    Url::parse(&raw).map_err(|e| ToolError::InvalidConfig(format!("{raw}: {e}")))
}

impl ExplorerSource<HolderItem> {
    pub fn token_holders(base_url: &str, token: Address) -> Result<Self> {
        Ok(Self::new(endpoint(base_url, &format!("tokens/{token:?}/holders"))?))
    }
}

impl ExplorerSource<TransactionItem> {
    pub fn address_transactions(base_url: &str, address: Address) -> Result<Self> {
        Ok(Self::new(endpoint(base_url, &format!("addresses/{address:?}/transactions"))?))
    }
}

/// Copies the cursor object field by field. Numbers keep their exact source
/// text (they overflow `f64`), strings are unquoted, `null` fields are left out.
fn query_pairs(params: BTreeMap<String, Box<RawValue>>) -> Result<QueryCursor> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, raw) in params {
        let text = raw.get().trim();
        let value = if text == "null" {
            continue;
        } else if text.starts_with('"') {
            serde_json::from_str::<String>(text)?
        } else {
            text.to_string()
        };
        pairs.push((key, value));
    }
    Ok(pairs)
}

impl<T: DeserializeOwned> PageSource for ExplorerSource<T> {
    type Cursor = QueryCursor;
    type Item = T;

    async fn request(&self, cursor: Option<&QueryCursor>) -> Result<String> {
        let mut req = self.client.get(self.url.clone());
        if let Some(pairs) = cursor {
            req = req.query(pairs);
        }
        Ok(req.send().await?.text().await?)
    }

    fn parse(&self, body: &str) -> Result<Page<T, QueryCursor>> {
        let resp: ListResponse<T> = serde_json::from_str(body)?;
        let next = resp
            .next_page_params
            .map(query_pairs)
            .transpose()?
            .filter(|pairs| !pairs.is_empty());
        Ok(Page {
            items: resp.items,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let holders = ExplorerSource::<HolderItem>::token_holders(
            "https://bnb.xterscan.io/api/v2/",
            "0x1f50002614EaE2765eeF81c6e2276A3d9b69e0E5".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(
            holders.url().as_str(),
            "https://bnb.xterscan.io/api/v2/tokens/0x1f50002614eae2765eef81c6e2276a3d9b69e0e5/holders"
        );

        assert!(ExplorerSource::<TransactionItem>::address_transactions("not a url", Address::zero()).is_err());
    }

    #[test]
    fn test_holders_page() {
        let source = ExplorerSource::<HolderItem>::token_holders("https://scan.test/api/v2", Address::zero()).unwrap();
        let page = source
            .parse(
                r#"{"items":[{"address":{"hash":"0xa09c","is_contract":false},"value":"2117505527137729000000"}],
                    "next_page_params":{"address_hash":"0xa09c","items_count":50,"value":2117505527137729000000}}"#,
            )
            .unwrap();

        assert_eq!(page.items[0].value, "2117505527137729000000");
        let next = page.next.unwrap();
        assert!(next.contains(&("address_hash".to_string(), "0xa09c".to_string())));
        assert!(next.contains(&("items_count".to_string(), "50".to_string())));
        assert!(next.contains(&("value".to_string(), "2117505527137729000000".to_string())));
        assert_eq!(next.len(), 3);
    }

    #[test]
    fn test_null_or_empty_params_end() {
        let source = ExplorerSource::<HolderItem>::token_holders("https://scan.test/api/v2", Address::zero()).unwrap();
        assert!(source.parse(r#"{"items":[],"next_page_params":null}"#).unwrap().next.is_none());
        assert!(source.parse(r#"{"items":[],"next_page_params":{}}"#).unwrap().next.is_none());
        assert!(source.parse(r#"{"items":[]}"#).unwrap().next.is_none());
    }

    #[test]
    fn test_odd_value_passes_through() {
        let source = ExplorerSource::<HolderItem>::token_holders("https://scan.test/api/v2", Address::zero()).unwrap();
        let page = source
            .parse(r#"{"items":[{"address":{"hash":"0x1"},"value":"12abc"}],"next_page_params":null}"#)
            .unwrap();
        assert_eq!(page.items[0].value, "12abc");
    }

    #[test]
    fn test_transactions_page_drops_null_params() {
        let source = ExplorerSource::<TransactionItem>::address_transactions("https://scan.test/api/v2", Address::zero()).unwrap();
        let page = source
            .parse(
                r#"{"items":[{"hash":"0x3b33","gas_used":"21000","gas_price":"6313000","fee":{"type":"actual","value":"132573000000"}}],
                    "next_page_params":{"block_number":2011690,"fee":"132579000000","hash":"0x3b33","index":1,
                    "inserted_at":"2024-08-19T21:43:52.843112Z","items_count":50,"value":"0","filter":null}}"#,
            )
            .unwrap();

        assert_eq!(page.items[0].fee.value, "132573000000");
        let next = page.next.unwrap();
        assert_eq!(next.len(), 7);
        assert!(next.contains(&("inserted_at".to_string(), "2024-08-19T21:43:52.843112Z".to_string())));
        assert!(!next.iter().any(|(k, _)| k == "filter"));
    }
}
