// CLI entry point for the parlor room server.
//
// Starts a standalone server that game clients connect to. Rooms are
// created on demand as clients join and destroyed when they empty. See
// `server.rs` for the networking architecture and `room.rs` for the
// per-room session state.
//
// Usage:
//   parlor [OPTIONS]
//     --port <PORT>    Listen port (default: 8080)

use parlor_server::server::{ServerConfig, start_server};

fn main() {
    let config = parse_args();

    let (_handle, addr) = match start_server(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            std::process::exit(1);
        }
    };

    println!("Room server listening on {addr}");
    println!("Press Ctrl+C to stop.");

    // Keep the handle alive for the lifetime of the process; the process
    // exits on SIGINT/SIGTERM, which tears all threads down. If graceful
    // shutdown is needed later, add the `ctrlc` crate and call
    // `handle.stop()` from its handler.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}

/// Parse command-line arguments into a `ServerConfig`. Uses simple
/// `std::env::args()` matching — no clap dependency.
fn parse_args() -> ServerConfig {
    let mut config = ServerConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_usage() {
    println!("Usage: parlor [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --port <PORT>    Listen port (default: 8080)");
    println!("  --help, -h       Show this help");
}
