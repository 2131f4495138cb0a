//! Host-side helper: `cargo run` builds the WASM bundle into `static/pkg` and
//! serves `static/` locally so the page can be opened in a browser.
//!
//! `QPGEN_PORT` picks the port (default 8000).

use std::process::{Command, Stdio};
use std::{env, thread, time::Duration};

fn main() {
    // Only meaningful on non-wasm targets.
    if env::var("TARGET").unwrap_or_default() == "wasm32-unknown-unknown" {
        return;
    }

    println!("Building WASM pkg …");
    match Command::new("wasm-pack")
        .args([
            "build",
            "--release",
            "--target",
            "web",
            "--out-dir",
            "static/pkg",
        ])
        .status()
    {
        Ok(st) if st.success() => {}
        Ok(_) => {
            eprintln!("wasm-pack finished with errors. Ensure the wasm32-unknown-unknown target is installed.");
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("wasm-pack not found in PATH. Serving whatever is already in static/pkg.");
        }
    }

    let port = env::var("QPGEN_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8000);

    println!("Serving static/ at http://127.0.0.1:{port} …");
    let server = Command::new("python3")
        .args(["-m", "http.server", &port.to_string(), "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn();
    if let Err(err) = server {
        eprintln!("could not start python3 http.server: {err}");
        std::process::exit(1);
    }

    // Keep process alive
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}
