use std::time::{SystemTime, UNIX_EPOCH};

use graylog_poll::GraylogFixture;
use serde_json::json;
use tokio::net::UdpSocket;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fixture = GraylogFixture::from_env();
    let input_id = fixture.initialize().await?;
    println!("gelf udp input ready: {input_id}");

    let test_id = format!(
        "demo-{}",
        SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis()
    );
    let packet = json!({
        "version": "1.1",
        "host": "graylog-poll-demo",
        "short_message": "hello from graylog-poll",
        "_test_id": test_id,
    });

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket
        .send_to(&serde_json::to_vec(&packet)?, fixture.log_endpoint())
        .await?;

    let message = fixture.wait_for_message(&test_id).await?;
    println!("{}", serde_json::to_string_pretty(message.as_value())?);

    Ok(())
}
