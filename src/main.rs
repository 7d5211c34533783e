use drive_folder_map::config::Config;
use drive_folder_map::handler::router;
use drive_folder_map::tracer::{
  ContextExt, format_error_chain, init_logging, setup_panic_hook,
};
use drive_folder_map::{AppResult, info};

use std::env;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::Arc;

fn perform_health_check() -> bool {
  println!("Performing health check... status: OK.");
  true
}

async fn run_app() -> AppResult<()> {
  let config = Config::from_env();
  let _log_guard = init_logging(config.log_dir.as_deref());
  config.report();

  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
  let app = router(Arc::new(config));

  let listener = tokio::net::TcpListener::bind(addr)
    .await
    .cwl(&format!("Could not bind {addr}"))?;
  info!("Listening for triggers on {}", addr);

  axum::serve(listener, app)
    .await
    .cwl("HTTP server stopped unexpectedly")?;

  Ok(())
}

#[tokio::main]
async fn main() {
  eprintln!("=== DRIVE FOLDER MAP STARTING ===");
  setup_panic_hook();

  let args: Vec<String> = env::args().collect();
  if args.len() > 1 && args[1] == "--health-check" {
    if perform_health_check() {
      std::process::exit(0);
    } else {
      std::process::exit(1);
    }
  }

  if let Err(e) = run_app().await {
    eprintln!(
      "\n--- APPLICATION FAILED ---\nError: {}",
      format_error_chain(&e)
    );
    let _ = io::stderr().flush();
    std::process::exit(1);
  }
}
