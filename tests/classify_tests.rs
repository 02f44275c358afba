#![allow(missing_docs)]

use std::any::Any;

use nbtlink::classify::{Container, Safety, Stack};
use nbtlink::tag::Compound;
use nbtlink::{
    Classifier, CustomData, DataRegistry, Engine, EngineConfig, Error, Schema, SchemaData,
};

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Sword,
    Axe,
    Apple,
}

/// Counts how often an item was used.
#[derive(Debug, Default)]
struct Wear {
    uses: i32,
}

impl CustomData for Wear {
    fn category(&self) -> &str {
        "wear"
    }

    fn read_from(&mut self, tree: &Compound) {
        self.uses = tree.get_int("uses").unwrap_or_default();
    }

    fn write_to(&self, tree: &mut Compound) {
        tree.put_int("uses", self.uses);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Fixture {
    registry: DataRegistry<Stack<Item>>,
    swords: Classifier<Stack<Item>>,
    tools: Classifier<Stack<Item>>,
    food: Classifier<Stack<Item>>,
}

fn fixture(config: &EngineConfig) -> Fixture {
    let swords = Classifier::of(Item::Sword);
    let tools = Classifier::any_of([Item::Sword, Item::Axe]);
    let food =
        Classifier::custom(Safety::Single, |stack: &Stack<Item>| stack.kind() == &Item::Apple);

    let mut registry = DataRegistry::with_config(config);
    registry.register_schema(swords.clone(), Schema::builder("sharpness").int("level").build());
    registry.register(tools.clone(), Wear::default);
    registry.register_schema(food.clone(), Schema::builder("freshness").double("ratio").build());

    Fixture {
        registry,
        swords,
        tools,
        food,
    }
}

#[test]
fn matching_classifiers_each_attach_an_object() {
    let f = fixture(&EngineConfig::default());
    assert_eq!(f.registry.len(), 3);

    let mut sword = Stack::new(Item::Sword);
    let categories: Vec<String> = f
        .registry
        .get_all(&mut sword)
        .into_iter()
        .map(|data| data.category().to_owned())
        .collect();
    assert_eq!(categories, ["sharpness", "wear"]);
    assert_eq!(sword.attachments().len(), 2);

    // Defaults were primed into the container's own tree.
    assert_eq!(sword.tree().get_compound("wear").and_then(|w| w.get_int("uses")), Some(0));
    assert!(sword.tree().get_compound("freshness").is_none());

    let sharpness = f
        .registry
        .get(&mut sword, &f.swords)
        .map(|d| d.map(|d| d.category().to_owned()));
    assert_eq!(sharpness.ok().flatten().as_deref(), Some("sharpness"));
    let food = f.registry.get(&mut sword, &f.food).map(|d| d.is_some());
    assert!(matches!(food, Ok(false)));
}

#[test]
fn attached_objects_are_cached_per_container() {
    let f = fixture(&EngineConfig::default());
    let mut sword = Stack::new(Item::Sword);
    let mut other = Stack::new(Item::Sword);

    f.registry.compute_all(&mut sword, |data| {
        if let Some(wear) = data.as_any_mut().downcast_mut::<Wear>() {
            wear.uses += 1;
        }
    });
    f.registry.compute_all(&mut sword, |data| {
        if let Some(wear) = data.as_any_mut().downcast_mut::<Wear>() {
            wear.uses += 1;
        }
    });

    let uses = |registry: &DataRegistry<Stack<Item>>, stack: &mut Stack<Item>| {
        registry
            .get_all(stack)
            .into_iter()
            .find_map(|d| d.as_any().downcast_ref::<Wear>().map(|w| w.uses))
    };
    assert_eq!(uses(&f.registry, &mut sword), Some(2));
    assert_eq!(uses(&f.registry, &mut other), Some(0));
}

#[test]
fn single_classifiers_sharing_a_container_keep_their_own_data() {
    let by_kind = Classifier::of(Item::Sword);
    let by_predicate =
        Classifier::custom(Safety::Single, |stack: &Stack<Item>| stack.kind() == &Item::Sword);

    let mut registry = DataRegistry::new();
    registry.register_schema(by_kind.clone(), Schema::builder("forge").int("heat").build());
    registry.register_schema(by_predicate.clone(), Schema::builder("owner").string("name").build());

    let mut sword = Stack::new(Item::Sword);
    let category = |registry: &DataRegistry<Stack<Item>>,
                    stack: &mut Stack<Item>,
                    classifier: &Classifier<Stack<Item>>| {
        registry
            .get(stack, classifier)
            .ok()
            .flatten()
            .map(|data| data.category().to_owned())
    };
    assert_eq!(category(&registry, &mut sword, &by_kind).as_deref(), Some("forge"));
    assert_eq!(category(&registry, &mut sword, &by_predicate).as_deref(), Some("owner"));
    assert_eq!(category(&registry, &mut sword, &by_kind).as_deref(), Some("forge"));
    assert_eq!(sword.attachments().len(), 2);
}

#[test]
fn multi_classifiers_are_rejected_for_single_lookups() {
    let f = fixture(&EngineConfig::default());
    let mut axe = Stack::new(Item::Axe);
    assert!(matches!(
        f.registry.get(&mut axe, &f.tools),
        Err(Error::UnsafeClassifier(id)) if id == f.tools.id()
    ));

    let lenient = fixture(&EngineConfig {
        strict_classifiers: false,
        ..EngineConfig::default()
    });
    let mut axe = Stack::new(Item::Axe);
    let found = lenient
        .registry
        .get(&mut axe, &lenient.tools)
        .map(|d| d.map(|d| d.category().to_owned()));
    assert_eq!(found.ok().flatten().as_deref(), Some("wear"));
}

#[test]
fn single_lookups_and_compute_helpers() {
    let f = fixture(&EngineConfig::default());
    let mut apple = Stack::new(Item::Apple);

    let freshness = f.registry.get_as::<SchemaData>(&mut apple, &f.food);
    assert_eq!(freshness.ok().flatten().map(|d| d.data().get::<f64>("ratio")), Some(0.0));

    assert!(matches!(f.registry.get(&mut apple, &f.swords), Ok(None)));
    assert!(matches!(
        f.registry.compute_or_fail(&mut apple, &f.swords, |_| {}),
        Err(Error::NoMatch)
    ));

    let updated = f.registry.compute_if(
        &mut apple,
        &f.food,
        |data| data.category() == "freshness",
        |data| {
            if let Some(schema_data) = data.as_any_mut().downcast_mut::<SchemaData>() {
                schema_data.data_mut().put("ratio", 0.75_f64);
            }
        },
    );
    assert!(matches!(updated, Ok(true)));

    let skipped = f.registry.compute_all_if(&mut apple, |data| data.category() == "wear", |_| {});
    assert!(!skipped);

    let mut axe = Stack::new(Item::Axe);
    assert!(f.registry.compute_all_or_fail(&mut axe, |_| {}).is_ok());
}

#[test]
fn attachments_round_trip_through_save_and_load() {
    let f = fixture(&EngineConfig::default());
    let mut sword = Stack::new(Item::Sword);

    f.registry.for_all_matching(&mut sword, |classifier, data| {
        if classifier == &f.swords {
            if let Some(schema_data) = data.as_any_mut().downcast_mut::<SchemaData>() {
                schema_data.data_mut().put("level", 3);
            }
        } else if let Some(wear) = data.as_any_mut().downcast_mut::<Wear>() {
            wear.uses = 40;
        }
    });

    let saved = f.registry.on_save(&mut sword, Compound::new());
    assert_eq!(saved.get_compound("sharpness").and_then(|s| s.get_int("level")), Some(3));
    assert_eq!(saved.get_compound("wear").and_then(|w| w.get_int("uses")), Some(40));

    let mut loaded = Stack::new(Item::Sword);
    f.registry.on_load(&mut loaded, &saved);
    assert_eq!(loaded.attachments().len(), 2);
    let level = f
        .registry
        .get_as::<SchemaData>(&mut loaded, &f.swords)
        .ok()
        .flatten()
        .map(|d| d.data().get::<i32>("level"));
    assert_eq!(level, Some(3));
}

#[test]
fn engine_custom_data_pipeline() {
    let engine = Engine::new();
    let mut root = Compound::new();

    let mut wear = Wear { uses: 5 };
    engine.use_custom(&mut wear, &mut root, |w| w.uses += 1);
    assert_eq!(root.get_compound("wear").and_then(|w| w.get_int("uses")), Some(6));

    // Stored data wins over the in-memory state on the next access.
    let mut fresh = Wear::default();
    engine.prepare_custom(&mut fresh, &mut root);
    assert_eq!(fresh.uses, 6);

    let registry = engine.data_registry::<Stack<Item>>();
    assert!(registry.is_empty());
}
