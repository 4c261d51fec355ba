use std::process::Command;
use tether::{mcp, ToolService};

#[tokio::test]
async fn test_launch_spawns_weather_server_over_stdio() {
    let connection = mcp::launch(env!("CARGO_BIN_EXE_weather-server"))
        .await
        .unwrap();

    let mut names: Vec<String> = connection
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|tool| tool.name.to_string())
        .collect();
    names.sort();
    assert_eq!(names, ["get_alerts", "get_forecast"]);

    let info = connection.peer_info().unwrap();
    assert_eq!(info.server_info.name, "weather");

    connection.cancel().await.unwrap();
}

#[test]
fn test_client_without_server_path_prints_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_tether"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end(), "Usage: tether <path_to_server_script>");
}
