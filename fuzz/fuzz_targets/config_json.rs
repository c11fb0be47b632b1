#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_locator::{DependencyConfig, TypeCatalog};

trait Audio: Send + Sync {}
trait Saves: Send + Sync {}
struct Hud;
struct Minimap;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let catalog = TypeCatalog::new()
        .capability::<dyn Audio>("Audio")
        .capability::<dyn Saves>("Saves")
        .consumer::<Hud>("Hud")
        .consumer::<Minimap>("Minimap");

    // Loading must reject or accept, never panic; accepted configs must survive a roundtrip
    if let Ok(config) = DependencyConfig::from_json(json, &catalog) {
        let written = config.to_json(&catalog).unwrap();
        let reloaded = DependencyConfig::from_json(&written, &catalog).unwrap();
        assert_eq!(reloaded.len(), config.len());
    }
});
