use async_trait::async_trait;
use console::style;
use pixeltap_core::{OutboundRequest, Result, Transport};

/// Prints each request instead of sending it.
pub struct DryRunTransport;

#[async_trait]
impl Transport for DryRunTransport {
    async fn post(&self, request: OutboundRequest) -> Result<u16> {
        let body: serde_json::Value = serde_json::from_str(&request.body)?;
        let mut output = format!(
            "{} {}\n",
            style("POST").cyan().bold(),
            style(request.url.as_str()).dim()
        );
        if let Some(cookie) = &request.cookie {
            output.push_str(&format!("{} {}\n", style("Cookie:").dim(), cookie));
        }
        output.push_str(&serde_json::to_string_pretty(&body)?);
        println!("{}\n", output);
        Ok(200)
    }
}
