use esbcenter::{ApiClient, ClientConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Reads ESB_APP_KEY, ESB_CUSTOMER_ID, ESB_SECRET (and optional ESB_VERSION, ESB_BASE_URL)
    let config = ClientConfig::from_env("ESB")?;
    let client = ApiClient::new(config)?;

    let order = json!({
        "deliveryOrder": {
            "deliveryOrderCode": "DO-0001",
            "orderType": "JYCK",
            "warehouseCode": "WH01",
        },
        "orderLines": [
            {"itemCode": "SKU-1", "planQty": 1},
        ],
    });

    println!("Creating delivery order...");
    match client.create_delivery_order(&order).await {
        Ok(response) => println!("Response ({}): {}", response.status(), response.text()),
        Err(e) => println!("Error creating delivery order: {}", e),
    }

    Ok(())
}
