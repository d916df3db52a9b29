use super::*;
use crate::def::Syntax;
use crate::layout::{FieldLayout, WireType};
use crate::MAX_FIELD_NUMBER;
use pretty_assertions::assert_eq;
use prost_types::field_descriptor_proto::{Label as ProtoLabel, Type};
use prost_types::{
    descriptor_proto::ExtensionRange, DescriptorProto, EnumDescriptorProto,
    EnumValueDescriptorProto, FieldDescriptorProto, MessageOptions, MethodDescriptorProto,
    OneofDescriptorProto, ServiceDescriptorProto,
};

fn file(name: &str, package: &str, deps: &[&str]) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        dependency: deps.iter().map(|d| d.to_string()).collect(),
        ..Default::default()
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

fn scalar(name: &str, number: i32, field_type: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(ProtoLabel::Optional as i32),
        r#type: Some(field_type as i32),
        ..Default::default()
    }
}

fn typed(name: &str, number: i32, field_type: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, field_type)
    }
}

fn extension(name: &str, number: i32, extendee: &str, field_type: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        extendee: Some(extendee.to_string()),
        ..scalar(name, number, field_type)
    }
}

fn extendable(name: &str, start: i32, end: i32) -> DescriptorProto {
    DescriptorProto {
        extension_range: vec![ExtensionRange {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }],
        ..message(name, vec![])
    }
}

/// A container using the legacy message-set wire format, with the
/// `extensions 4 to max` range protoc emits for it
fn message_set_container(name: &str) -> DescriptorProto {
    DescriptorProto {
        options: Some(MessageOptions {
            message_set_wire_format: Some(true),
            ..Default::default()
        }),
        ..extendable(name, 4, i32::MAX)
    }
}

fn color_enum() -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some("Color".to_string()),
        value: ["RED", "GREEN"]
            .iter()
            .enumerate()
            .map(|(number, name)| EnumValueDescriptorProto {
                name: Some(name.to_string()),
                number: Some(number as i32),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn foo_file() -> FileDescriptorProto {
    FileDescriptorProto {
        message_type: vec![message("Foo", vec![])],
        ..file("a.proto", "pkg", &[])
    }
}

fn symbol_names(pool: &DefPool) -> Vec<String> {
    let mut names: Vec<String> = pool.symbols().iter().map(|(name, _)| name.to_string()).collect();
    names.sort();
    names
}

#[test]
fn test_add_file_makes_symbols_visible() {
    let mut pool = DefPool::new();
    let added = pool.add_file(&foo_file()).unwrap().id;

    let foo = pool.find_message_by_name("pkg.Foo").expect("message registered");
    assert_eq!(foo.full_name, "pkg.Foo");
    assert_eq!(foo.file, added);
    assert_eq!(pool.find_file_by_name("a.proto").map(|f| f.id), Some(added));
    assert_eq!(
        pool.find_file_containing_symbol("pkg.Foo").map(|f| f.id),
        Some(added)
    );
    assert_eq!(pool.file(added).messages, vec![foo.id]);
}

#[test]
fn test_every_kind_is_registered_under_its_qualified_name() {
    let mut proto = file("all.proto", "pkg", &[]);
    proto.message_type = vec![DescriptorProto {
        nested_type: vec![message("Inner", vec![])],
        enum_type: vec![color_enum()],
        ..extendable("Outer", 100, 200)
    }];
    proto.enum_type = vec![EnumDescriptorProto {
        name: Some("Top".to_string()),
        ..color_enum()
    }];
    proto.enum_type[0].value[0].name = Some("TOP_RED".to_string());
    proto.enum_type[0].value[1].name = Some("TOP_GREEN".to_string());
    proto.extension = vec![extension("ext", 100, "Outer", Type::Int32)];
    proto.service = vec![ServiceDescriptorProto {
        name: Some("Svc".to_string()),
        method: vec![MethodDescriptorProto {
            name: Some("Call".to_string()),
            input_type: Some(".pkg.Outer".to_string()),
            output_type: Some("Outer.Inner".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }];

    let mut pool = DefPool::new();
    pool.add_file(&proto).unwrap();

    assert_eq!(
        symbol_names(&pool),
        vec![
            "pkg.Outer",
            "pkg.Outer.Color",
            "pkg.Outer.GREEN",
            "pkg.Outer.Inner",
            "pkg.Outer.RED",
            "pkg.Svc",
            "pkg.TOP_GREEN",
            "pkg.TOP_RED",
            "pkg.Top",
            "pkg.ext",
        ]
    );

    let inner = pool.find_message_by_name("pkg.Outer.Inner").unwrap();
    let outer = pool.find_message_by_name("pkg.Outer").unwrap();
    assert_eq!(inner.containing_type, Some(outer.id));

    let red = pool.find_enum_value_by_name("pkg.Outer.RED").unwrap();
    assert_eq!(pool.enum_def(red.parent).full_name, "pkg.Outer.Color");
    assert_eq!(red.number, 0);

    let svc = pool.find_service_by_name("pkg.Svc").unwrap();
    let call = svc.find_method_by_name("Call").unwrap();
    assert_eq!(call.full_name, "pkg.Svc.Call");
    assert_eq!(call.input_type, outer.id);
    assert_eq!(call.output_type, inner.id);

    let ext = pool.find_extension_by_name("pkg.ext").unwrap();
    assert_eq!(ext.containing_type, Some(outer.id));
    assert!(ext.is_extension());
}

#[test]
fn test_lookup_with_wrong_kind_is_not_found() {
    let mut proto = foo_file();
    proto.enum_type = vec![color_enum()];
    let mut pool = DefPool::new();
    pool.add_file(&proto).unwrap();

    assert!(pool.find_enum_by_name("pkg.Foo").is_none());
    assert!(pool.find_service_by_name("pkg.Foo").is_none());
    assert!(pool.find_extension_by_name("pkg.Foo").is_none());
    assert!(pool.find_message_by_name("pkg.Color").is_none());
    assert!(pool.find_enum_value_by_name("pkg.Color").is_none());
    assert!(pool.find_enum_by_name("pkg.Color").is_some());
    assert!(pool.symbols().lookup("pkg.RED", DefKind::Message).is_none());
    assert_eq!(
        pool.symbols().lookup_any("pkg.RED").map(|def| def.kind()),
        Some(DefKind::EnumValue)
    );
}

#[test]
fn test_lookups_accept_subslices() {
    let mut pool = DefPool::new();
    pool.add_file(&foo_file()).unwrap();

    let buffer = "pkg.Foo.bar";
    assert!(pool.find_message_by_name(&buffer[..7]).is_some());
    assert!(pool.find_message_by_name(buffer).is_none());
}

#[test]
fn test_duplicate_file_is_rejected_without_mutation() {
    let mut pool = DefPool::new();
    pool.add_file(&foo_file()).unwrap();
    let before = symbol_names(&pool);

    let mut again = foo_file();
    again.message_type.push(message("Bar", vec![]));
    let err = pool.add_file(&again).unwrap_err();

    assert!(matches!(err, Error::DuplicateFile { ref name } if name == "a.proto"));
    assert_eq!(symbol_names(&pool), before);
    assert_eq!(pool.file_count(), 1);
    assert!(pool.find_message_by_name("pkg.Bar").is_none());
}

#[test]
fn test_failed_add_rolls_back_all_symbols() {
    let mut pool = DefPool::new();
    pool.add_file(&foo_file()).unwrap();
    let before = symbol_names(&pool);

    let mut broken = file("b.proto", "pkg", &["a.proto"]);
    broken.message_type = vec![
        message("Good", vec![scalar("id", 1, Type::Int64)]),
        message("Bad", vec![typed("missing", 1, Type::Message, "pkg.Missing")]),
    ];
    broken.enum_type = vec![color_enum()];

    let err = pool.add_file(&broken).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("b.proto"), "{text}");
    assert!(text.contains("pkg.Missing"), "{text}");
    assert!(err.is_recoverable());

    assert!(!pool.symbols().contains("pkg.Good"));
    assert!(!pool.symbols().contains("pkg.Bad"));
    assert!(!pool.symbols().contains("pkg.Color"));
    assert!(!pool.symbols().contains("pkg.RED"));
    assert!(pool.find_file_by_name("b.proto").is_none());
    assert_eq!(symbol_names(&pool), before);

    // The same name can be loaded once fixed.
    broken.message_type[1] = message("Bad", vec![typed("fine", 1, Type::Message, "Foo")]);
    let fixed = pool.add_file(&broken).unwrap().id;
    assert_eq!(pool.find_message_by_name("pkg.Good").unwrap().file, fixed);
}

#[test]
fn test_failed_add_keeps_other_files_symbols() {
    let mut pool = DefPool::new();
    pool.add_file(&foo_file()).unwrap();

    // Redeclaring another file's symbol fails; the existing binding stays put.
    let mut clash = file("clash.proto", "pkg", &[]);
    clash.message_type = vec![message("Other", vec![]), message("Foo", vec![])];
    let err = pool.add_file(&clash).unwrap_err();

    assert!(err.to_string().contains("duplicate symbol 'pkg.Foo'"));
    let foo = pool.find_message_by_name("pkg.Foo").unwrap();
    assert_eq!(pool.file(foo.file).name, "a.proto");
    assert!(!pool.symbols().contains("pkg.Other"));
}

#[test]
fn test_failed_extension_leaves_no_registry_entry() {
    let mut pool = DefPool::new();
    let mut base = file("base.proto", "pkg", &[]);
    base.message_type = vec![extendable("Host", 100, 200)];
    pool.add_file(&base).unwrap();

    let mut broken = file("ext.proto", "pkg", &["base.proto"]);
    broken.extension = vec![extension("ok", 100, "Host", Type::Int32)];
    broken.message_type = vec![message("Bad", vec![typed("x", 1, Type::Enum, "Nope")])];
    assert!(pool.add_file(&broken).is_err());

    let host = pool.find_message_by_name("pkg.Host").unwrap();
    assert!(pool.extension_registry().is_empty());
    assert!(pool.find_extension_by_number(host, 100).is_none());
    assert_eq!(pool.extension_count(host), 0);
}

#[test]
fn test_file_containing_plain_field_falls_back_to_message() {
    let mut pool = DefPool::new();
    pool.add_file(&foo_file()).unwrap();

    let mut proto = file("b.proto", "pkg", &[]);
    proto.message_type = vec![DescriptorProto {
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("choice".to_string()),
            ..Default::default()
        }],
        ..message(
            "Holder",
            vec![
                scalar("bar", 1, Type::String),
                FieldDescriptorProto {
                    oneof_index: Some(0),
                    ..scalar("picked", 2, Type::Bool)
                },
            ],
        )
    }];
    let b = pool.add_file(&proto).unwrap().id;

    assert!(!pool.symbols().contains("pkg.Holder.bar"));
    assert_eq!(
        pool.find_file_containing_symbol("pkg.Holder.bar").map(|f| f.id),
        Some(b)
    );
    assert_eq!(
        pool.find_file_containing_symbol("pkg.Holder.choice").map(|f| f.id),
        Some(b)
    );
    assert!(pool.find_file_containing_symbol("pkg.Holder.nope").is_none());
    assert!(pool.find_file_containing_symbol("nope").is_none());
    assert!(pool.find_file_containing_symbol("pkg.Foo.bar").is_none());

    let holder = pool.find_message_by_name("pkg.Holder").unwrap();
    assert_eq!(holder.oneofs[0].fields.len(), 1);
    assert!(matches!(pool.find_member("pkg.Holder.choice"), Some(Member::Oneof(0))));
}

#[test]
fn test_file_containing_enum_value_uses_its_enum() {
    let mut proto = foo_file();
    proto.enum_type = vec![color_enum()];
    let mut pool = DefPool::new();
    let a = pool.add_file(&proto).unwrap().id;

    assert_eq!(pool.find_file_containing_symbol("pkg.GREEN").map(|f| f.id), Some(a));
    assert_eq!(pool.find_file_containing_symbol("pkg.Color").map(|f| f.id), Some(a));
}

#[test]
fn test_extension_by_number_and_by_name_agree() {
    let mut pool = DefPool::new();
    let mut base = file("base.proto", "pkg", &[]);
    base.message_type = vec![extendable("Host", 100, 200)];
    pool.add_file(&base).unwrap();

    let mut ext = file("ext.proto", "pkg", &["base.proto"]);
    ext.extension = vec![
        extension("first", 100, "Host", Type::Int32),
        extension("second", 150, ".pkg.Host", Type::String),
    ];
    pool.add_file(&ext).unwrap();

    let host = pool.find_message_by_name("pkg.Host").unwrap();
    let by_number = pool.find_extension_by_number(host, 150).unwrap();
    let by_name = pool.find_extension_by_name("pkg.second").unwrap();
    assert_eq!(by_number.id, by_name.id);
    assert_eq!(by_number.field_type, FieldType::String);
    assert!(pool.find_extension_by_number(host, 120).is_none());

    let layout = pool.extension_layout(by_number.extension.unwrap());
    assert_eq!(layout.extendee, host.layout);
    assert_eq!(layout.field.wire_type, WireType::Len);

    let all: Vec<&str> = pool
        .all_extensions(host)
        .iter()
        .map(|f| f.full_name.as_str())
        .collect();
    assert_eq!(all, vec!["pkg.first", "pkg.second"]);
    assert_eq!(pool.extension_count(host), 2);
}

#[test]
fn test_extension_outside_range_is_rejected() {
    let mut pool = DefPool::new();
    let mut proto = file("a.proto", "pkg", &[]);
    proto.message_type = vec![extendable("Host", 100, 200)];
    proto.extension = vec![extension("far", 300, "Host", Type::Int32)];

    let err = pool.add_file(&proto).unwrap_err();
    assert!(err.to_string().contains("no extension range"), "{err}");
    assert!(pool.symbols().is_empty());
}

#[test]
fn test_duplicate_extension_number_is_rejected() {
    let mut pool = DefPool::new();
    let mut base = file("base.proto", "pkg", &[]);
    base.message_type = vec![extendable("Host", 100, 200)];
    base.extension = vec![extension("taken", 100, "Host", Type::Int32)];
    pool.add_file(&base).unwrap();

    let mut other = file("other.proto", "other", &["base.proto"]);
    other.extension = vec![extension("again", 100, "pkg.Host", Type::Int32)];
    let err = pool.add_file(&other).unwrap_err();

    assert!(err.to_string().contains("duplicate extension"), "{err}");
    assert!(!pool.symbols().contains("other.again"));
    assert_eq!(pool.extension_registry().len(), 1);
}

#[test]
fn test_message_set_item_resolves_by_message_name() {
    let mut proto = file("mset.proto", "pkg", &[]);
    let container = message_set_container("Container");
    let item = DescriptorProto {
        extension: vec![FieldDescriptorProto {
            type_name: Some(".pkg.Item".to_string()),
            ..extension("message_set_extension", 1000, ".pkg.Container", Type::Message)
        }],
        ..message("Item", vec![scalar("payload", 1, Type::Bytes)])
    };
    proto.message_type = vec![container, item, message("Plain", vec![])];

    let mut pool = DefPool::new();
    pool.add_file(&proto).unwrap();

    let item = pool.find_message_by_name("pkg.Item").unwrap();
    assert!(pool.is_message_set_item(item));
    let by_message = pool.find_extension_by_name("pkg.Item").unwrap();
    let by_name = pool
        .find_extension_by_name("pkg.Item.message_set_extension")
        .unwrap();
    assert_eq!(by_message.id, by_name.id);
    assert!(pool.find_extension_by_name("pkg.Plain").is_none());

    let container = pool.find_message_by_name("pkg.Container").unwrap();
    assert!(pool.layout(container.layout).message_set);
    assert_eq!(
        pool.find_extension_by_number(container, 1000).map(|f| f.id),
        Some(by_name.id)
    );
}

#[test]
fn test_message_set_range_may_reach_max() {
    let mut proto = file("bridge/message_set.proto", "proto2.bridge", &[]);
    proto.message_type = vec![message_set_container("MessageSet")];

    let mut pool = DefPool::new();
    pool.add_file(&proto).unwrap();

    let container = pool.find_message_by_name("proto2.bridge.MessageSet").unwrap();
    assert_eq!(container.extension_ranges, vec![4..i32::MAX]);
    assert!(container.is_extension_number(MAX_FIELD_NUMBER));
    assert!(!container.is_extension_number(3));
}

#[test]
fn test_range_to_max_needs_message_set_format() {
    let mut proto = file("a.proto", "pkg", &[]);
    proto.message_type = vec![extendable("Host", 4, i32::MAX)];

    let mut pool = DefPool::new();
    let err = pool.add_file(&proto).unwrap_err();
    assert!(err.to_string().contains("invalid extension range"), "{err}");
    assert!(pool.symbols().is_empty());
}

#[test]
fn test_group_extension_is_not_message_set_item() {
    let mut proto = file("group.proto", "pkg", &[]);
    let item = DescriptorProto {
        extension: vec![FieldDescriptorProto {
            type_name: Some(".pkg.Item".to_string()),
            ..extension("item", 1000, ".pkg.Container", Type::Group)
        }],
        ..message("Item", vec![])
    };
    proto.message_type = vec![message_set_container("Container"), item];

    let mut pool = DefPool::new();
    pool.add_file(&proto).unwrap();

    let item = pool.find_message_by_name("pkg.Item").unwrap();
    assert!(!pool.is_message_set_item(item));
    assert!(pool.find_extension_by_name("pkg.Item").is_none());
    assert!(pool.find_extension_by_name("pkg.Item.item").is_some());
}

#[test]
fn test_dependencies_must_be_loaded_first() {
    let mut pool = DefPool::new();
    let mut proto = file("b.proto", "pkg", &["a.proto"]);
    proto.message_type = vec![message("Bar", vec![])];

    let err = pool.add_file(&proto).unwrap_err();
    assert!(err.to_string().contains("has not been loaded"), "{err}");
    assert!(pool.symbols().is_empty());

    let a = pool.add_file(&foo_file()).unwrap().id;
    let b = pool.add_file(&proto).unwrap();
    assert_eq!(b.dependencies, vec![a]);
}

#[test]
fn test_relative_type_names_resolve_from_inner_scope() {
    let mut proto = file("scope.proto", "pkg.sub", &[]);
    proto.message_type = vec![
        message("Target", vec![]),
        DescriptorProto {
            nested_type: vec![message("Target", vec![])],
            enum_type: vec![color_enum()],
            ..message(
                "User",
                vec![
                    typed("inner", 1, Type::Message, "Target"),
                    typed("outer", 2, Type::Message, "sub.Target"),
                    FieldDescriptorProto {
                        r#type: None,
                        ..typed("color", 3, Type::Enum, "Color")
                    },
                ],
            )
        },
    ];
    let mut pool = DefPool::new();
    pool.add_file(&proto).unwrap();

    let user = pool.find_message_by_name("pkg.sub.User").unwrap();
    let fields: Vec<&FieldDef> = user.fields.iter().map(|&f| pool.field(f)).collect();
    let nested = pool.find_message_by_name("pkg.sub.User.Target").unwrap().id;
    let top = pool.find_message_by_name("pkg.sub.Target").unwrap().id;
    let color = pool.find_enum_by_name("pkg.sub.User.Color").unwrap().id;

    assert_eq!(fields[0].type_ref, Some(TypeRef::Message(nested)));
    assert_eq!(fields[1].type_ref, Some(TypeRef::Message(top)));
    assert_eq!(fields[2].type_ref, Some(TypeRef::Enum(color)));
    assert_eq!(fields[2].field_type, FieldType::Enum);
    assert_eq!(fields[0].containing_type, Some(user.id));
}

#[test]
fn test_mismatched_type_kind_is_rejected() {
    let mut proto = foo_file();
    proto.enum_type = vec![color_enum()];
    proto.message_type.push(message(
        "Wrong",
        vec![typed("c", 1, Type::Message, "Color")],
    ));

    let mut pool = DefPool::new();
    let err = pool.add_file(&proto).unwrap_err();
    assert!(err.to_string().contains("does not match"), "{err}");
    assert!(pool.symbols().is_empty());
}

#[test]
fn test_invalid_declarations_are_rejected() {
    let cases: Vec<(FileDescriptorProto, &str)> = vec![
        (
            FileDescriptorProto {
                message_type: vec![message("1Bad", vec![])],
                ..file("a.proto", "pkg", &[])
            },
            "invalid message name",
        ),
        (
            FileDescriptorProto {
                message_type: vec![message("M", vec![scalar("x", 0, Type::Int32)])],
                ..file("a.proto", "pkg", &[])
            },
            "invalid field number 0",
        ),
        (
            FileDescriptorProto {
                message_type: vec![message(
                    "M",
                    vec![scalar("x", 1, Type::Int32), scalar("y", 1, Type::Int32)],
                )],
                ..file("a.proto", "pkg", &[])
            },
            "duplicate field number 1",
        ),
        (
            FileDescriptorProto {
                enum_type: vec![EnumDescriptorProto {
                    name: Some("Empty".to_string()),
                    ..Default::default()
                }],
                ..file("a.proto", "pkg", &[])
            },
            "at least one value",
        ),
        (
            FileDescriptorProto {
                syntax: Some("proto3".to_string()),
                enum_type: vec![EnumDescriptorProto {
                    value: vec![EnumValueDescriptorProto {
                        name: Some("ONE".to_string()),
                        number: Some(1),
                        ..Default::default()
                    }],
                    ..color_enum()
                }],
                ..file("a.proto", "pkg", &[])
            },
            "must be zero",
        ),
        (
            FileDescriptorProto {
                message_type: vec![message("M", vec![typed("x", 1, Type::Message, "")])],
                ..file("a.proto", "pkg", &[])
            },
            "missing a type name",
        ),
        (file("a.proto", "bad-pkg", &[]), "invalid package name"),
        (file("", "pkg", &[]), "missing file name"),
    ];

    for (proto, expected) in cases {
        let mut pool = DefPool::new();
        let err = pool.add_file(&proto).unwrap_err();
        assert!(err.to_string().contains(expected), "{err} should mention {expected}");
        assert!(pool.symbols().is_empty());
        assert_eq!(pool.file_count(), 0);
    }
}

#[test]
fn test_derived_layouts_follow_field_types() {
    let mut proto = file("layout.proto", "pkg", &[]);
    proto.syntax = Some("proto3".to_string());
    proto.message_type = vec![message(
        "M",
        vec![
            scalar("b", 3, Type::Fixed32),
            scalar("a", 1, Type::String),
            FieldDescriptorProto {
                label: Some(ProtoLabel::Repeated as i32),
                ..scalar("nums", 2, Type::Int32)
            },
        ],
    )];
    let mut pool = DefPool::new();
    let added = pool.add_file(&proto).unwrap();
    assert_eq!(added.syntax, Syntax::Proto3);

    let m = pool.find_message_by_name("pkg.M").unwrap();
    let layout = pool.layout(m.layout);
    let wire: Vec<(i32, WireType)> = layout
        .fields
        .iter()
        .map(|f| (f.number, f.wire_type))
        .collect();
    assert_eq!(
        wire,
        vec![(1, WireType::Len), (2, WireType::Len), (3, WireType::I32)]
    );
    assert!(pool.field(m.fields[2]).packed);
    assert!(!layout.extendable);
}

#[test]
fn test_supplied_layout_is_used_and_checked() {
    let mut proto = file("given.proto", "pkg", &[]);
    proto.message_type = vec![DescriptorProto {
        nested_type: vec![message("Inner", vec![])],
        ..message("Outer", vec![scalar("x", 1, Type::Int32)])
    }];
    let outer_layout = MessageLayout::new(
        vec![FieldLayout {
            number: 1,
            wire_type: WireType::I32,
            repeated: false,
        }],
        false,
        false,
    );
    let good = FileLayout {
        messages: vec![outer_layout.clone(), MessageLayout::default()],
        extensions: vec![],
    };

    let mut pool = DefPool::new();
    pool.add_file_with_layout(&proto, Some(&good)).unwrap();
    let outer = pool.find_message_by_name("pkg.Outer").unwrap();
    assert_eq!(pool.layout(outer.layout), &outer_layout);

    let short = FileLayout {
        messages: vec![outer_layout],
        extensions: vec![],
    };
    let mut pool = DefPool::new();
    let err = pool.add_file_with_layout(&proto, Some(&short)).unwrap_err();
    assert!(err.to_string().contains("mismatched layout"), "{err}");
    assert!(pool.symbols().is_empty());

    let wrong_numbers = FileLayout {
        messages: vec![MessageLayout::default(), MessageLayout::default()],
        extensions: vec![],
    };
    let err = pool.add_file_with_layout(&proto, Some(&wrong_numbers)).unwrap_err();
    assert!(err.to_string().contains("pkg.Outer"), "{err}");
}

#[test]
fn test_add_file_bytes_decodes_and_counts() {
    let bytes = foo_file().encode_to_vec();
    let mut pool = DefPool::new();
    pool.add_file_bytes(&bytes).unwrap();

    assert_eq!(pool.bytes_loaded(), bytes.len());
    assert!(pool.find_message_by_name("pkg.Foo").is_some());
    assert!(matches!(
        pool.add_file_bytes(&[0x0A, 0xFF]),
        Err(Error::DescriptorParse(_))
    ));
    // Undecodable input still counts, as in bundled loading.
    assert_eq!(pool.bytes_loaded(), bytes.len() + 2);
}

#[test]
fn test_preallocated_pool_behaves_like_default() {
    let config = PoolConfig::new().symbol_capacity(128).file_capacity(16);
    let mut pool = DefPool::try_with_config(config).unwrap();
    pool.add_file(&foo_file()).unwrap();
    assert_eq!(pool.files().count(), 1);
    assert_eq!(pool.bytes_loaded(), 0);
}
