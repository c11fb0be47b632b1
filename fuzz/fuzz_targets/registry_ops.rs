#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_locator::{
    key_of, CapabilityId, DependencyConfig, DependencyConsumer, DependencyContainer,
    DependencyList, DependencyResolver, ServiceRegistry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CapA;
struct CapB;
struct Service;

#[derive(Default)]
struct Probe {
    injections: AtomicUsize,
}

impl DependencyConsumer for Probe {
    fn inject_dependencies(&self, dependencies: DependencyContainer) {
        assert_eq!(dependencies.len(), 2);
        self.injections.fetch_add(1, Ordering::SeqCst);
    }
}

fn capability(byte: u8) -> CapabilityId {
    if byte & 1 == 0 {
        key_of::<CapA>()
    } else {
        key_of::<CapB>()
    }
}

fuzz_target!(|data: &[u8]| {
    let config = DependencyConfig::builder()
        .add::<Probe>(DependencyList::new().depends_on::<CapA>().depends_on::<CapB>())
        .build()
        .unwrap();
    let registry = ServiceRegistry::new();
    let resolver = DependencyResolver::new(registry.clone(), config);

    let mut services: Vec<(CapabilityId, Arc<Service>)> = Vec::new();
    let mut probes: Vec<Arc<Probe>> = Vec::new();

    // Each byte is one operation: low bits pick the op, the rest its target
    for &byte in data {
        let target = (byte >> 3) as usize;
        match byte & 0b111 {
            0 | 1 => {
                let cap = capability(byte >> 3);
                let service = Arc::new(Service);
                if registry.register(cap, &service).is_ok() {
                    services.push((cap, service));
                }
            }
            2 => {
                let cap = capability(byte >> 3);
                if let Some(pos) = services.iter().position(|(c, _)| *c == cap) {
                    let (_, service) = services.remove(pos);
                    registry.withdraw(cap, &service).unwrap();
                } else {
                    assert!(registry.withdraw(cap, &Arc::new(Service)).is_err());
                }
            }
            3 | 4 => {
                let probe = Arc::new(Probe::default());
                resolver.register_for_dependencies(&probe);
                probes.push(probe);
            }
            5 => {
                if !probes.is_empty() {
                    let probe = &probes[target % probes.len()];
                    resolver.unregister_for_dependencies(probe);
                }
            }
            6 => {
                if !probes.is_empty() {
                    probes.remove(target % probes.len());
                }
            }
            _ => resolver.process_pending(),
        }

        for probe in &probes {
            assert!(probe.injections.load(Ordering::SeqCst) <= 1);
        }
    }
});
