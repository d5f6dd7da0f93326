use std::time::{Duration, Instant};
use wsdial::ws::{ClientEvent, CloseCode, Message, WebSocketClient};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Usage: cargo run --example connect -- ws://127.0.0.1:8080/chat [protocol...]
    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "ws://127.0.0.1:8080/".to_string());
    let protocols: Vec<String> = args.collect();

    // Lookups and TCP connects run here; the poll loop below stays on this thread.
    let runtime = tokio::runtime::Runtime::new()?;
    let mut client: WebSocketClient = WebSocketClient::with_runtime(runtime.handle().clone());
    client.connect_to_url(&url, &protocols, &[])?;
    println!("Connecting to {url}");

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut greeted = false;
    loop {
        client.poll();

        while let Some(event) = client.next_event() {
            match event {
                ClientEvent::Connected { protocol } => {
                    println!("✅ Connected (protocol: {protocol:?}, load state: {:?})", client.load_state());
                    client.peer_mut().send(Message::Text("hello from wsdial".into()))?;
                    greeted = true;
                }
                ClientEvent::Disconnected { was_clean } => {
                    println!("Disconnected (clean: {was_clean})");
                    return Ok(());
                }
                ClientEvent::Error(e) => {
                    println!("❌ Failed: {e} (code {})", e.as_i32());
                    return Ok(());
                }
            }
        }

        if greeted {
            while let Some(message) = client.peer_mut().recv() {
                println!("⬅️  {message:?}");
                client.disconnect_from_host(CloseCode::NORMAL, "done");
            }
        }

        if Instant::now() > deadline {
            println!("Timed out in {:?}", client.load_state());
            client.disconnect_from_host(CloseCode::GOING_AWAY, "timeout");
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
