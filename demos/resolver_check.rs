// # Resolver Helper Validation Tool
//
// Runs the external DoH helper once, the same way forced resolution does,
// and prints what it answered. Useful for checking a deployment's
// `http-tool` and upstream proxy before enabling `force_resolution`.
//
// ## Usage
//
// ```bash
// SUBSYNC_UPSTREAM_PROXY=http://127.0.0.1:7890 \
// cargo run -p subsync_demos --bin resolver_check -- example.com www.example.org
// ```
//
// ## Environment Variables
//
// Required:
// - `SUBSYNC_UPSTREAM_PROXY`: Proxy the helper tunnels DoH requests through
//
// Optional:
// - `SUBSYNC_RESOLVER_PATH`: Helper executable (default: `http-tool` on PATH)
// - `SUBSYNC_RESOLVER_TIMEOUT_SECS`: Bound on the helper run (default: none)

use std::collections::BTreeSet;
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use subsync_core::traits::ResolverBackend;
use subsync_resolver_process::{ProcessResolverBackend, lookup_url};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn backend_from_env() -> Result<ProcessResolverBackend, String> {
    let backend = match env::var("SUBSYNC_RESOLVER_PATH") {
        Ok(path) => ProcessResolverBackend::new(path),
        Err(_) => ProcessResolverBackend::from_path().map_err(|e| e.to_string())?,
    };

    match env::var("SUBSYNC_RESOLVER_TIMEOUT_SECS") {
        Ok(raw) => {
            let secs: u64 = raw
                .parse()
                .map_err(|_| format!("SUBSYNC_RESOLVER_TIMEOUT_SECS is not a number: '{}'", raw))?;
            Ok(backend.with_timeout(Duration::from_secs(secs)))
        }
        Err(_) => Ok(backend),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let hostnames: BTreeSet<String> = env::args().skip(1).collect();
    if hostnames.is_empty() {
        eprintln!("usage: resolver_check <hostname>...");
        return ExitCode::from(1);
    }

    let upstream_proxy = match env::var("SUBSYNC_UPSTREAM_PROXY") {
        Ok(proxy) if !proxy.trim().is_empty() => proxy,
        _ => {
            eprintln!("SUBSYNC_UPSTREAM_PROXY is required");
            return ExitCode::from(1);
        }
    };

    let backend = match backend_from_env() {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    println!("=== Resolver Helper Check ===");
    println!("Helper:  {}", backend.binary_path().display());
    println!("Proxy:   {}", upstream_proxy);
    for hostname in &hostnames {
        println!("Lookup:  {}", lookup_url(hostname));
    }
    println!();

    match backend.resolve(&upstream_proxy, &hostnames).await {
        Ok(answers) => {
            for hostname in &hostnames {
                match answers.get(hostname) {
                    Some(ip) => println!("✓ {} -> {}", hostname, ip),
                    None => println!("✗ {} (no answer, hostname would be kept)", hostname),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("✗ Resolver failed: {}", e);
            println!("  Forced resolution would keep every hostname unchanged.");
            ExitCode::from(2)
        }
    }
}
