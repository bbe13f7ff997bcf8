use axum::extract::Path;
use axum::http::{Method, StatusCode};
use axum::{Json, Router, routing};
use clap::Parser;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Stand-in for the protected application: echoes every request it receives.
#[derive(Parser, Debug)]
#[command(name = "upstream", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 9001)]
    port: u16,

    #[arg(short, long, default_value = "127.0.0.1")]
    ip: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    println!("{:?}", args);

    let listener = TcpListener::bind(format!("{}:{}", args.ip, args.port))
        .await
        .unwrap();
    let app = Router::new().route("/{*path}", routing::any(handler));
    axum::serve(listener, app).await.unwrap();
}

async fn handler(method: Method, Path(path): Path<String>) -> (StatusCode, Json<Value>) {
    let status = if method == Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(json!({ "method": method.as_str(), "path": format!("/{path}") })))
}
