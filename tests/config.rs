use ferrous_locator::{
    key_of, ConfigError, ConsumerIdentity, DependencyConfig, DependencyConsumer,
    DependencyContainer, DependencyList, DependencyResolver, ServiceRegistry, TypeKey,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Audio: Send + Sync {}
trait Saves: Send + Sync {}
struct Mixer;
impl Audio for Mixer {}
struct SaveSlots;
impl Saves for SaveSlots {}

// Marker types consumers can declare themselves as
struct MenuScreen;
struct Widget;

#[derive(Default)]
struct OptionsMenu {
    injected: AtomicUsize,
    saw_saves: AtomicUsize,
}

impl DependencyConsumer for OptionsMenu {
    fn inject_dependencies(&self, dependencies: DependencyContainer) {
        self.injected.fetch_add(1, Ordering::SeqCst);
        if dependencies.get::<dyn Saves>().is_some() {
            self.saw_saves.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn type_tags(&self) -> Vec<TypeKey> {
        vec![key_of::<MenuScreen>(), key_of::<Widget>()]
    }
}

#[test]
fn test_tagged_consumer_matches_base_entry() {
    let config = DependencyConfig::builder()
        .add::<MenuScreen>(DependencyList::new().depends_on::<dyn Audio>())
        .build()
        .unwrap();
    let registry = ServiceRegistry::new();
    let resolver = DependencyResolver::new(registry.clone(), config);

    let menu = Arc::new(OptionsMenu::default());
    resolver.register_for_dependencies(&menu);
    assert!(resolver.is_pending(&menu));

    let mixer: Arc<dyn Audio> = Arc::new(Mixer);
    registry.register_service::<dyn Audio>(&mixer).unwrap();
    assert_eq!(menu.injected.load(Ordering::SeqCst), 1);
}

#[test]
fn test_first_matching_entry_wins() {
    // Widget appears before the concrete type, so its (smaller) list is used
    let config = DependencyConfig::builder()
        .add::<Widget>(DependencyList::new().depends_on::<dyn Audio>())
        .add::<OptionsMenu>(
            DependencyList::new()
                .depends_on::<dyn Audio>()
                .depends_on::<dyn Saves>(),
        )
        .build()
        .unwrap();

    let identity = ConsumerIdentity::of::<OptionsMenu>()
        .with_tag::<MenuScreen>()
        .with_tag::<Widget>();
    let deps = config.requirements_for(&identity).unwrap();
    assert_eq!(deps.as_slice(), &[key_of::<dyn Audio>()]);

    let registry = ServiceRegistry::new();
    let resolver = DependencyResolver::new(registry.clone(), config);
    let menu = Arc::new(OptionsMenu::default());
    resolver.register_for_dependencies(&menu);

    let mixer: Arc<dyn Audio> = Arc::new(Mixer);
    registry.register_service::<dyn Audio>(&mixer).unwrap();
    assert_eq!(menu.injected.load(Ordering::SeqCst), 1);
    assert_eq!(menu.saw_saves.load(Ordering::SeqCst), 0);
}

#[test]
fn test_empty_requirement_list_resolves_immediately() {
    let config = DependencyConfig::builder()
        .add::<OptionsMenu>(DependencyList::new())
        .build()
        .unwrap();
    let resolver = DependencyResolver::new(ServiceRegistry::new(), config);

    let menu = Arc::new(OptionsMenu::default());
    resolver.register_for_dependencies(&menu);
    assert_eq!(menu.injected.load(Ordering::SeqCst), 1);
}

#[test]
fn test_duplicate_requirements_collapse() {
    let list = DependencyList::new()
        .depends_on::<dyn Audio>()
        .depends_on::<dyn Saves>()
        .depends_on::<dyn Audio>();
    assert_eq!(list.len(), 2);
    assert!(list.contains(&key_of::<dyn Saves>()));
}

#[test]
fn test_duplicate_consumer_entry_rejected() {
    let errors = DependencyConfig::builder()
        .add::<OptionsMenu>(DependencyList::new())
        .add::<Widget>(DependencyList::new())
        .add::<OptionsMenu>(DependencyList::new().depends_on::<dyn Audio>())
        .build()
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors.errors()[0],
        ConfigError::DuplicateConsumer { index: 2, .. }
    ));
}

#[cfg(feature = "config")]
mod json {
    use super::*;
    use ferrous_locator::TypeCatalog;

    fn catalog() -> TypeCatalog {
        TypeCatalog::new()
            .capability::<dyn Audio>("Audio")
            .capability::<dyn Saves>("Saves")
            .consumer::<OptionsMenu>("OptionsMenu")
            .consumer::<MenuScreen>("MenuScreen")
    }

    #[test]
    fn test_load_and_resolve() {
        let json = r#"{
            "name": "Menus",
            "dependencies": [
                { "consumer": "MenuScreen", "requires": ["Audio", "Saves"] }
            ]
        }"#;
        let config = DependencyConfig::from_json(json, &catalog()).unwrap();
        assert_eq!(config.name(), "Menus");
        assert_eq!(config.len(), 1);

        let registry = ServiceRegistry::new();
        let resolver = DependencyResolver::new(registry.clone(), config);
        let menu = Arc::new(OptionsMenu::default());
        resolver.register_for_dependencies(&menu);

        let mixer: Arc<dyn Audio> = Arc::new(Mixer);
        let saves: Arc<dyn Saves> = Arc::new(SaveSlots);
        registry.register_service::<dyn Audio>(&mixer).unwrap();
        assert_eq!(menu.injected.load(Ordering::SeqCst), 0);
        registry.register_service::<dyn Saves>(&saves).unwrap();
        assert_eq!(menu.injected.load(Ordering::SeqCst), 1);
        assert_eq!(menu.saw_saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_all_errors_reported_at_load() {
        let json = r#"{
            "dependencies": [
                { "consumer": "Ghost", "requires": ["Audio"] },
                { "consumer": "OptionsMenu", "requires": ["Physics", "MenuScreen"] }
            ]
        }"#;
        let errors = DependencyConfig::from_json(json, &catalog()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(&errors.errors()[0], ConfigError::UnknownConsumer { index: 0, name } if name == "Ghost"));
        assert!(matches!(&errors.errors()[1], ConfigError::UnknownCapability { index: 1, name } if name == "Physics"));
        assert!(matches!(&errors.errors()[2], ConfigError::NotACapability { index: 1, name } if name == "MenuScreen"));
        assert!(errors.to_string().starts_with("3 config error(s)"));
    }

    #[test]
    fn test_malformed_json() {
        let errors = DependencyConfig::from_json("{ not json", &catalog()).unwrap_err();
        assert!(matches!(errors.errors()[0], ConfigError::Parse(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_order() {
        let config = DependencyConfig::builder()
            .named("Menus")
            .add::<MenuScreen>(DependencyList::new().depends_on::<dyn Saves>())
            .add::<OptionsMenu>(DependencyList::new().depends_on::<dyn Audio>())
            .build()
            .unwrap();
        let json = config.to_json(&catalog()).unwrap();
        let loaded = DependencyConfig::from_json(&json, &catalog()).unwrap();

        assert_eq!(loaded.name(), "Menus");
        let consumers: Vec<_> = loaded.entries().iter().map(|e| e.consumer).collect();
        assert_eq!(consumers, vec![key_of::<MenuScreen>(), key_of::<OptionsMenu>()]);
    }
}
