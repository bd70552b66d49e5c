use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use flexcode::gateway::{EntryPoint, GatewayClient, GatewayError, RemoteExecution};
use flexcode::handlers;

/// Minimal stand-in for the interpreter gateway: remembers the last text set
/// and answers `get_result` through `eval`.
async fn spawn_fake_gateway(
    eval: fn(&str) -> String,
) -> Result<(String, JoinHandle<Vec<String>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();

    let handle = tokio::spawn(async move {
        let mut commands = Vec::new();
        let Ok((stream, _)) = listener.accept().await else {
            return commands;
        };
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        let mut program = String::new();

        loop {
            let mut command = Vec::new();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line == "e" => break,
                    Ok(Some(line)) => command.push(line),
                    _ => return commands,
                }
            }
            commands.push(command.join("|"));

            let reply = match command.get(2).map(String::as_str) {
                Some("set_text") => {
                    let arg = command.get(3).cloned().unwrap_or_default();
                    program = unescape(arg.strip_prefix('s').unwrap_or(&arg));
                    "!yv\n".to_string()
                }
                Some("get_result") => {
                    let result = eval(&program);
                    match result.strip_prefix("ERR:") {
                        Some(msg) => format!("!xs{}\n", escape(msg)),
                        None => format!("!ys{}\n", escape(&result)),
                    }
                }
                _ => "!xsunknown method\n".to_string(),
            };
            if write.write_all(reply.as_bytes()).await.is_err() {
                return commands;
            }
        }
    });

    Ok((addr, handle))
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\r', "\\r").replace('\n', "\\n")
}

fn unescape(s: &str) -> String {
    flexcode::gateway::protocol::unescape(s)
}

fn echo_lines(program: &str) -> String {
    program.trim_end().replace('\n', ",")
}

#[tokio::test]
async fn test_submit_and_fetch_over_tcp() -> Result<()> {
    let (addr, server) = spawn_fake_gateway(echo_lines).await?;
    let mut client = GatewayClient::connect(&addr, EntryPoint::default()).await?;

    client.submit("VAR a = 1\nVAR b = 2\n").await?;
    let result = client.fetch_result().await?;
    assert_eq!(result, "VAR a = 1,VAR b = 2");

    drop(client);
    let commands = server.await?;
    assert_eq!(
        commands,
        vec![
            "c|t|set_text|sVAR a = 1\\nVAR b = 2\\n".to_string(),
            "c|t|get_result".to_string(),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_remote_error_is_reported() -> Result<()> {
    let (addr, _server) = spawn_fake_gateway(|_| "ERR:Invalid Syntax: Expected ')'".into()).await?;
    let mut client = GatewayClient::connect(&addr, EntryPoint::default()).await?;

    client.submit("(1 + 2").await?;
    match client.fetch_result().await {
        Err(GatewayError::Remote(msg)) => assert_eq!(msg, "Invalid Syntax: Expected ')'"),
        other => panic!("unexpected: {other:?}"),
    }
    // A remote-side error does not break the connection.
    assert!(client.is_connected());
    Ok(())
}

#[tokio::test]
async fn test_headless_run_formats_result() -> Result<()> {
    let (addr, _server) = spawn_fake_gateway(|_| "1,2,3".into()).await?;
    let mut client = GatewayClient::connect(&addr, EntryPoint::default()).await?;

    let text = handlers::run::run_with(&mut client, "[1, 2, 3]", false).await?;
    assert_eq!(text, "1\n2\n3");
    let raw = handlers::run::run_with(&mut client, "[1, 2, 3]", true).await?;
    assert_eq!(raw, "1,2,3");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_gateway_fails_every_call() -> Result<()> {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        listener.local_addr()?.to_string()
    };

    let err = GatewayClient::connect(&addr, EntryPoint::default()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Connect { .. }));

    let mut client = GatewayClient::connect_or_offline(&addr, EntryPoint::default()).await;
    assert!(!client.is_connected());
    assert!(matches!(client.submit("1").await, Err(GatewayError::NotConnected { .. })));
    assert!(matches!(client.fetch_result().await, Err(GatewayError::NotConnected { .. })));
    assert!(client.describe().contains("offline"));
    Ok(())
}

#[tokio::test]
async fn test_closed_connection_is_not_reopened() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    let server = tokio::spawn(async move {
        // Accept and immediately hang up.
        let (stream, _) = listener.accept().await.ok()?;
        drop(stream);
        Some(())
    });

    let mut client = GatewayClient::connect(&addr, EntryPoint::default()).await?;
    server.await?;

    let first = client.submit("1").await.unwrap_err();
    assert!(
        matches!(first, GatewayError::ConnectionClosed | GatewayError::Io(_)),
        "unexpected: {first:?}"
    );
    assert!(!client.is_connected());
    assert!(matches!(client.fetch_result().await, Err(GatewayError::NotConnected { .. })));
    Ok(())
}
