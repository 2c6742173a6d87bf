mod client;
mod error;
mod hex;
mod rpc;
mod types;

pub use client::UpstreamClient;
pub use error::UpstreamError;
pub use hex::{hex_to_i128, hex_to_u64, u64_to_hex};
pub use types::{Block, Chain, ChainConfig, Transaction, TransactionReceipt};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::method,
        Mock, MockServer, ResponseTemplate,
    };

    async fn mock_server_returning(result: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 0, "result": result })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn block_number_decodes_hex_result() {
        let server = mock_server_returning(json!("0x10")).await;
        let url = server.uri();
        let (host, port) = split_host_port(&url);
        let client = UpstreamClient::new(&host, port, Chain::Mainnet);

        assert_eq!(client.block_number().await.unwrap(), 16);
    }

    #[tokio::test]
    async fn submit_work_decodes_bool_result() {
        let server = mock_server_returning(json!(true)).await;
        let url = server.uri();
        let (host, port) = split_host_port(&url);
        let client = UpstreamClient::new(&host, port, Chain::Mainnet);

        assert!(client.submit_work("0x1", "0x2", "0x3").await.unwrap());
    }

    fn split_host_port(url: &str) -> (String, u16) {
        let without_scheme = url.trim_start_matches("http://");
        let mut parts = without_scheme.splitn(2, ':');
        let host = parts.next().unwrap().to_owned();
        let port: u16 = parts.next().unwrap().trim_end_matches('/').parse().unwrap();
        (host, port)
    }
}
