use anyhow::Result;
use serde::Serialize;
use serde_blocklist::{Annotation, Blocklist, BlocklistError, RuleOrigin, TypeCatalog};
use std::collections::BTreeMap;

mod geometry {
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    pub struct Point {
        pub x: i32,
        pub y: i32,
    }

    pub mod shapes {
        use serde::Serialize;

        #[derive(Debug, Serialize)]
        pub struct Square {
            pub side: u32,
        }
    }
}

mod public {
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    pub struct Label {
        pub text: String,
    }
}

struct DisableSerialization;
impl Annotation for DisableSerialization {}

#[derive(Debug, Serialize)]
struct Drawing {
    label: public::Label,
    points: Vec<geometry::Point>,
}

fn package(name: &str) -> String {
    format!("{}::{}", module_path!(), name)
}

fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog
        .annotate::<geometry::Point, DisableSerialization>()
        .register::<geometry::shapes::Square>()
        .register::<public::Label>()
        .register::<Drawing>();
    catalog
}

fn point() -> geometry::Point {
    geometry::Point { x: 1, y: 2 }
}

#[test]
fn test_disallow_serialization_by_package() -> Result<()> {
    let blocklist = Blocklist::builder()
        .catalog(catalog())
        .packages([package("geometry")])
        .block::<BTreeMap<String, String>>()
        .build()?;

    assert_eq!(blocklist.to_string(&vec![1, 2, 3, 4])?, "[1,2,3,4]");

    let mut map = BTreeMap::new();
    map.insert("a".to_string(), "b".to_string());
    assert!(blocklist.to_string(&map).unwrap_err().is_disallowed());

    let err = blocklist.to_string(&point()).unwrap_err();
    assert_eq!(err.to_string(), "Attempted to serialize disallowed type Point");

    let square = geometry::shapes::Square { side: 3 };
    assert!(blocklist.to_string(&square).unwrap_err().is_disallowed());

    let label = public::Label {
        text: "ok".to_string(),
    };
    assert_eq!(blocklist.to_string(&label)?, r#"{"text":"ok"}"#);
    Ok(())
}

#[test]
fn test_disallow_serialization_by_type() -> Result<()> {
    let blocklist = Blocklist::builder()
        .block::<geometry::Point>()
        .block::<BTreeMap<String, String>>()
        .build()?;

    assert_eq!(blocklist.to_string(&vec![1, 2, 3, 4])?, "[1,2,3,4]");

    let mut map = BTreeMap::new();
    map.insert("a".to_string(), "b".to_string());
    assert!(blocklist.to_string(&map).is_err());
    assert!(blocklist.to_string(&point()).is_err());
    Ok(())
}

#[test]
fn test_disallow_serialization_by_annotation() -> Result<()> {
    let blocklist = Blocklist::builder()
        .catalog(catalog())
        .annotation::<DisableSerialization>()
        .build()?;

    match blocklist.to_string(&point()) {
        Err(BlocklistError::Disallowed { type_name, origin }) => {
            assert_eq!(type_name, "Point");
            assert_eq!(
                origin,
                RuleOrigin::Annotation("DisableSerialization".to_string())
            );
        }
        other => panic!("expected a disallowed error, got {:?}", other),
    }

    let square = geometry::shapes::Square { side: 3 };
    assert_eq!(blocklist.to_string(&square)?, r#"{"side":3}"#);
    Ok(())
}

#[test]
fn test_nested_blocked_value_fails_whole_document() -> Result<()> {
    let blocklist = Blocklist::builder()
        .catalog(catalog())
        .annotation::<DisableSerialization>()
        .build()?;

    let drawing = Drawing {
        label: public::Label {
            text: "d".to_string(),
        },
        points: vec![point()],
    };
    assert!(blocklist.to_value(&drawing).unwrap_err().is_disallowed());

    let empty = Drawing {
        label: public::Label {
            text: "d".to_string(),
        },
        points: Vec::new(),
    };
    assert_eq!(
        blocklist.to_value(&empty)?,
        serde_json::json!({"label": {"text": "d"}, "points": []})
    );
    Ok(())
}

#[test]
fn test_screen_with_other_serializers() -> Result<()> {
    let blocklist = Blocklist::builder().block::<geometry::Point>().build()?;

    let points = vec![point()];
    let screened = blocklist.screen(&points);
    assert!(serde_json::to_string(&screened).is_err());
    assert!(toml::to_string(&blocklist.screen(&point())).is_err());

    let label = public::Label {
        text: "fine".to_string(),
    };
    assert_eq!(
        toml::to_string(&blocklist.screen(&label))?,
        "text = \"fine\"\n"
    );
    assert!(blocklist.screen(&label).blocked().is_none());
    Ok(())
}

#[test]
fn test_empty_blocklist_is_transparent() -> Result<()> {
    let blocklist = Blocklist::builder().build()?;
    assert!(blocklist.is_empty());
    assert_eq!(
        blocklist.to_string_pretty(&point())?,
        serde_json::to_string_pretty(&point())?
    );

    let mut out = Vec::new();
    blocklist.to_writer(&mut out, &point())?;
    assert_eq!(out, blocklist.to_vec(&point())?);
    Ok(())
}
