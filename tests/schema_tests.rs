#![allow(missing_docs)]

use nbtlink::codec::{builtin, versioned, Codec, Identifier, MappedCodec};
use nbtlink::tag::Compound;
use nbtlink::{DataTree, Engine, FieldVersion, Schema, Value};
use uuid::Uuid;

// --- FIXTURES ---

fn everything() -> Schema {
    let position = Schema::builder("position").double("x").double("y").double("z").build();
    Schema::builder("everything")
        .byte("byte")
        .short("short")
        .int("int")
        .long("long")
        .float("float")
        .double("double")
        .bool("bool")
        .string("string")
        .byte_array("bytes")
        .int_array("ints")
        .long_array("longs")
        .uuid("owner")
        .nested("position", position)
        .build()
}

fn percent_codec() -> MappedCodec {
    MappedCodec::new(
        Identifier::new("demo", "percent"),
        Value::Int(0),
        |tree, key, value| match value {
            Value::Int(v) => {
                tree.put_int(key, *v);
                true
            }
            _ => false,
        },
        |tree, key| tree.get_int(key).map(Value::Int),
    )
    .with_version(FieldVersion::semantic(2, 0, 0))
    .with_migration(|content, from| {
        if !from.equals_to(&FieldVersion::semantic(1, 0, 0)) {
            return false;
        }
        match content.get_double(versioned::VALUE_KEY) {
            Some(ratio) => {
                content.put_int(versioned::VALUE_KEY, (ratio * 100.0).round() as i32);
                true
            }
            None => false,
        }
    })
}

// --- TESTS ---

#[test]
fn every_builtin_kind_survives_a_write_read_cycle() {
    let schema = everything();
    let owner = Uuid::new_v4();

    let mut data = DataTree::new();
    data.put("byte", -3_i8);
    data.put("short", 300_i16);
    data.put("int", 70_000_i32);
    data.put("long", 1_i64 << 40);
    data.put("float", 0.5_f32);
    data.put("double", -2.25_f64);
    data.put("bool", true);
    data.put("string", "hello".to_owned());
    data.put("bytes", vec![1_u8, 2, 3]);
    data.put("ints", vec![4_i32, 5]);
    data.put("longs", vec![6_i64]);
    data.put("owner", owner);
    data.get_or_create_compound("position").put("y", 64.0_f64);

    let mut tree = Compound::new();
    schema.write(&mut tree, &data);
    let read = schema.read_new(&tree);

    assert_eq!(read.get::<i8>("byte"), -3);
    assert_eq!(read.get::<i16>("short"), 300);
    assert_eq!(read.get::<i32>("int"), 70_000);
    assert_eq!(read.get::<i64>("long"), 1 << 40);
    assert_eq!(read.get::<f32>("float"), 0.5);
    assert_eq!(read.get::<f64>("double"), -2.25);
    assert!(read.get::<bool>("bool"));
    assert_eq!(read.get::<String>("string"), "hello");
    assert_eq!(read.get::<Vec<u8>>("bytes"), vec![1, 2, 3]);
    assert_eq!(read.get::<Vec<i32>>("ints"), vec![4, 5]);
    assert_eq!(read.get::<Vec<i64>>("longs"), vec![6]);
    assert_eq!(read.get::<Uuid>("owner"), owner);

    let position = read.get_compound("position").cloned().unwrap_or_default();
    assert_eq!(position.get::<f64>("x"), 0.0);
    assert_eq!(position.get::<f64>("y"), 64.0);
}

#[test]
fn player_stats_scenario() {
    let engine = Engine::new();
    let schema = Schema::builder("player_stats")
        .int("level")
        .double("experience")
        .string("title")
        .build();
    let mut root = Compound::new();

    let fresh = engine.prepare(&schema, &mut root);
    assert_eq!(fresh.get::<i32>("level"), 0);
    assert_eq!(fresh.get::<String>("title"), "");

    engine.use_schema(&schema, &mut root, |data| {
        data.put("level", 12);
        data.put("title", "Knight".to_owned());
    });

    let stats = root.get_compound("player_stats").cloned().unwrap_or_default();
    assert_eq!(stats.get_int("level"), Some(12));
    assert_eq!(stats.get_double("experience"), Some(0.0));
    assert_eq!(stats.get_string("title").as_deref(), Some("Knight"));
}

#[test]
fn player_stats_with_position_scenario() {
    let engine = Engine::new();
    let position = Schema::builder("position").double("x").double("y").double("z").build();
    let schema = Schema::builder("player_stats").int("level").nested("position", position).build();
    let mut root = Compound::new();

    let mut expected = DataTree::new();
    expected.put("level", 0);
    let pos = expected.get_or_create_compound("position");
    pos.put("x", 0.0);
    pos.put("y", 0.0);
    pos.put("z", 0.0);
    assert_eq!(engine.prepare(&schema, &mut root), expected);

    engine.use_schema(&schema, &mut root, |data| {
        data.put("level", 5);
        data.get_or_create_compound("position").put("x", 12.5);
    });

    expected.put("level", 5);
    expected.get_or_create_compound("position").put("x", 12.5);
    assert_eq!(engine.prepare(&schema, &mut root), expected);
}

#[test]
fn repeated_prepare_leaves_the_tree_unchanged() {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = Engine::new();

    for versioned in [false, true] {
        let mut schema = everything();
        schema.set_versioned(versioned);
        let mut root = Compound::new();

        let first = engine.prepare(&schema, &mut root);
        let after_first = root.clone();
        let second = engine.prepare(&schema, &mut root);

        assert_eq!(root, after_first);
        assert_eq!(first, second);
    }
}

#[test]
fn defaults_never_overwrite_customized_data() {
    let engine = Engine::new();
    let schema = Schema::builder("counter").int("value").build();
    let mut root = Compound::new();

    for expected in 1..=3 {
        engine.use_schema(&schema, &mut root, |data| {
            let next = data.get::<i32>("value") + 1;
            data.put("value", next);
        });
        assert_eq!(engine.prepare(&schema, &mut root).get::<i32>("value"), expected);
    }
}

#[test]
fn reading_leaves_the_tree_untouched() {
    let schema = everything();
    let mut tree = Compound::new();
    tree.put_int("int", 5);
    tree.put_string("unrelated", "keep me".to_owned());
    let before = tree.clone();

    let first = schema.read_new(&tree);
    let second = schema.read_new(&tree);
    assert_eq!(first, second);
    assert_eq!(tree, before);
    assert_eq!(first.get::<i32>("int"), 5);
}

#[test]
fn malformed_entries_read_as_fallbacks() {
    let schema = Schema::builder("stats").int("level").uuid("owner").bool("flag").build();
    let mut tree = Compound::new();
    tree.put_string("level", "not a number".to_owned());
    tree.put_int("owner", 3);

    let data = schema.read_new(&tree);
    assert_eq!(data.get::<i32>("level"), 0);
    assert_eq!(data.get::<Uuid>("owner"), Uuid::nil());
    assert!(!data.get::<bool>("flag"));
}

#[test]
fn unknown_keys_survive_a_write() {
    let schema = Schema::builder("stats").int("level").build();
    let mut tree = Compound::new();
    tree.put_string("note", "hand written".to_owned());

    let mut data = DataTree::new();
    data.put("level", 2);
    schema.write(&mut tree, &data);

    assert_eq!(tree.get_string("note").as_deref(), Some("hand written"));
    assert_eq!(tree.get_int("level"), Some(2));
}

#[test]
fn versioned_schemas_migrate_old_envelopes() {
    let schema = Schema::builder("quest")
        .field("progress", percent_codec().shared())
        .versioned(true)
        .build();

    let mut content = Compound::new();
    content.put_double(versioned::VALUE_KEY, 0.4);
    let mut envelope = Compound::new();
    envelope.put_string(versioned::VERSION_KEY, "1.0.0".to_owned());
    envelope.put_string(versioned::SERIALIZER_KEY, "demo:percent".to_owned());
    envelope.put_compound(versioned::CONTENT_KEY, content);
    let mut root = Compound::new();
    root.get_or_create_compound("quest").put_compound("progress", envelope);

    let engine = Engine::new();
    let progress = engine.use_schema(&schema, &mut root, |data| data.get::<i32>("progress"));
    assert_eq!(progress, 40);

    // Synchronizing rewrites the entry at the codec's current version.
    let stored = root
        .get_compound("quest")
        .and_then(|quest| quest.get_compound("progress"))
        .cloned()
        .unwrap_or_default();
    assert_eq!(stored.get_string(versioned::VERSION_KEY).as_deref(), Some("2.0.0"));
    let value = stored
        .get_compound(versioned::CONTENT_KEY)
        .and_then(|content| content.get_int(versioned::VALUE_KEY));
    assert_eq!(value, Some(40));
}

#[test]
fn legacy_entries_are_upgraded_in_place() {
    let schema = Schema::builder("stats")
        .int("level")
        .nested("inner", Schema::builder("inner").long("seed").versioned(true).build())
        .versioned(true)
        .build();

    let mut tree = Compound::new();
    tree.put_int("level", 9);
    tree.get_or_create_compound("inner").put_long("seed", 77);

    assert_eq!(schema.read_new(&tree).get::<i32>("level"), 9);
    assert_eq!(schema.upgrade_legacy(&mut tree), 2);
    assert_eq!(schema.upgrade_legacy(&mut tree), 0);

    let data = schema.read_new(&tree);
    assert_eq!(data.get::<i32>("level"), 9);
    assert_eq!(data.get_compound("inner").map(|inner| inner.get::<i64>("seed")), Some(77));
}

#[test]
fn every_builtin_codec_falls_back_on_absent_or_malformed_entries() {
    let expected = [
        Value::Byte(0),
        Value::Short(0),
        Value::Int(0),
        Value::Long(0),
        Value::Float(0.0),
        Value::Double(0.0),
        Value::Bool(false),
        Value::String(String::new()),
        Value::ByteArray(Vec::new()),
        Value::IntArray(Vec::new()),
        Value::LongArray(Vec::new()),
        Value::Uuid(Uuid::nil()),
    ];
    let codecs = builtin::all();
    assert_eq!(codecs.len(), expected.len());

    let empty = Compound::new();
    let mut malformed = Compound::new();
    malformed.put_compound("entry", Compound::new());

    for ((kind, codec), fallback) in codecs.iter().zip(expected) {
        assert_eq!(codec.kind(), *kind);
        assert_eq!(codec.fallback(), fallback, "{}", codec.id());
        assert_eq!(codec.read("entry", &empty), fallback, "{}", codec.id());
        assert_eq!(codec.read("entry", &malformed), fallback, "{}", codec.id());
    }
}

#[test]
fn version_equality() {
    assert!(FieldVersion::parse("1.2.3").equals_to(&FieldVersion::semantic(1, 2, 3)));
    assert!(FieldVersion::parse("4").equals_to(&FieldVersion::Integer(4)));
    assert!(!FieldVersion::parse("4").equals_to(&FieldVersion::semantic(4, 0, 0)));
    assert!(FieldVersion::parse("beta").equals_to(&FieldVersion::parse("beta")));
    assert!(FieldVersion::semantic_str("1.2").is_err());
}
