//! Times graph construction and resolution over repeated rounds: a
//! caller-owned cache of platform-style services is bound into a graph, then
//! every binding is resolved in a sweep.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use ikebana::ObjectGraph;

type Payload = Arc<dyn Any + Send + Sync>;

const ROUNDS: u32 = 100;

const SERVICES: [&str; 28] = [
    "Accessibility",
    "Account",
    "Activity",
    "Alarm",
    "Audio",
    "Clipboard",
    "Connectivity",
    "DevicePolicy",
    "Download",
    "DropBox",
    "InputMethod",
    "Keyguard",
    "LayoutInflater",
    "Location",
    "Nfc",
    "Notification",
    "Power",
    "Search",
    "Sensor",
    "Storage",
    "Telephony",
    "TextServices",
    "UiMode",
    "Usb",
    "Vibrator",
    "WifiP2p",
    "Wifi",
    "Window",
];

/// Caller-owned stand-in for a platform service registry: an explicit value
/// constructed up front and passed to every round, not ambient global state.
struct ServiceCache {
    services: Vec<(&'static str, Payload)>,
}

impl ServiceCache {
    fn new() -> Self {
        Self {
            services: SERVICES
                .iter()
                .map(|name| (*name, Arc::new(format!("{name}Manager")) as Payload))
                .collect(),
        }
    }
}

fn build_graph(cache: &ServiceCache) -> ObjectGraph<Payload> {
    let mut builder = ObjectGraph::builder();
    for (name, service) in &cache.services {
        let service = service.clone();
        builder = builder.singleton(*name, move |_| Ok(service.clone()));
    }
    builder.build().expect("service names are unique")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cache = ServiceCache::new();

    let start = Instant::now();
    for _ in 0..ROUNDS {
        std::hint::black_box(build_graph(&cache));
    }
    let build_nanos = start.elapsed().as_nanos() / u128::from(ROUNDS);

    let graph = build_graph(&cache);
    let start = Instant::now();
    for _ in 0..ROUNDS {
        for name in SERVICES {
            std::hint::black_box(graph.get(name).unwrap());
        }
    }
    let resolve_nanos = start.elapsed().as_nanos() / u128::from(ROUNDS);

    println!("graph construction:          {build_nanos} ns/round");
    println!(
        "resolution of {} bindings:   {resolve_nanos} ns/round",
        SERVICES.len()
    );
}
