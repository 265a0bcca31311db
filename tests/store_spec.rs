use std::io::Write;

use mystery_tree::error::TreeError;
use mystery_tree::models::*;
use mystery_tree::store::{flatten, load_tree_file, TreeStore};
use speculate2::speculate;

const TREE: &str = r#"[
    {"id": "animal", "name": "Animal", "type": "family", "children": [
        {"id": "mammal", "name": "Mammal", "type": "family", "children": [
            {"id": "mouse", "name": "Mouse", "type": "species",
             "description": "Small rodent", "imageUrl": "mouse.png"},
            {"id": "rat", "name": "Rat", "type": "species"}
        ]},
        {"id": "bird", "name": "Bird", "type": "family", "children": [
            {"id": "eagle", "name": "Eagle", "type": "species"}
        ]}
    ]},
    {"id": "plant", "name": "Plant", "type": "family", "children": [
        {"id": "oak", "name": "Oak", "type": "species"}
    ]}
]"#;

fn ids(path: &[NodeId]) -> Vec<&str> {
    path.iter().map(NodeId::as_str).collect()
}

fn flat_node(id: &str, parent: Option<&str>) -> Node {
    Node {
        id: NodeId::from(id),
        name: id.to_string(),
        description: String::new(),
        image_url: String::new(),
        kind: NodeKind::Family,
        parent_id: parent.map(NodeId::from),
    }
}

speculate! {
    describe "ingestion" {
        before {
            let store = TreeStore::from_json_str(TREE).expect("Failed to load tree");
        }

        it "flattens every node with parent links" {
            assert_eq!(store.len(), 8);
            assert_eq!(store.find_by_id("rat").unwrap().parent_id, Some(NodeId::from("mammal")));
            assert_eq!(store.find_by_id("animal").unwrap().parent_id, None);
        }

        it "keeps optional metadata and defaults the rest" {
            let mouse = store.find_by_id("mouse").unwrap();
            assert_eq!(mouse.description, "Small rodent");
            assert_eq!(mouse.image_url, "mouse.png");
            let rat = store.find_by_id("rat").unwrap();
            assert_eq!(rat.description, "");
            assert_eq!(rat.image_url, "");
        }
    }

    describe "document validation" {
        it "rejects an object instead of an array" {
            let result = TreeStore::from_json_str(r#"{"id": "a", "name": "A", "type": "family"}"#);
            assert!(matches!(result, Err(TreeError::InvalidTreeDocument { .. })));
        }

        it "rejects an empty document" {
            assert!(TreeStore::from_json_str("[]").is_err());
        }

        it "rejects entries without an id" {
            let result = TreeStore::from_json_str(r#"[{"name": "A", "type": "family"}]"#);
            assert!(result.is_err());
        }

        it "rejects an unknown node type" {
            let result = TreeStore::from_json_str(r#"[{"id": "a", "name": "A", "type": "genus"}]"#);
            assert!(result.is_err());
        }

        it "rejects duplicate ids" {
            let json = r#"[{"id": "a", "name": "A", "type": "family", "children": [
                              {"id": "a", "name": "Again", "type": "species"}]}]"#;
            let err = TreeStore::from_json_str(json).unwrap_err();
            assert!(err.to_string().contains("duplicate node id a"));
        }

        it "rejects parent cycles in flat records" {
            let result = TreeStore::from_nodes(vec![
                flat_node("a", Some("b")),
                flat_node("b", Some("a")),
            ]);
            assert!(result.is_err());
        }

        it "tolerates dangling parent references" {
            let store = TreeStore::from_nodes(vec![
                flat_node("a", None),
                flat_node("b", Some("ghost")),
            ]).expect("Failed to build store");
            assert_eq!(store.roots().len(), 2);
            assert_eq!(ids(&store.path_to_root("b")), vec!["b"]);
        }
    }

    describe "find_by_name" {
        before {
            let store = TreeStore::from_json_str(TREE).expect("Failed to load tree");
        }

        it "matches case-insensitively" {
            assert_eq!(store.find_by_name("mOuSe").unwrap().id.as_str(), "mouse");
            assert_eq!(store.find_by_name("EAGLE").unwrap().id.as_str(), "eagle");
        }

        it "returns None for unknown names" {
            assert!(store.find_by_name("unicorn").is_none());
        }
    }

    describe "name collisions" {
        it "returns the first match when names collide" {
            let json = r#"[{"id": "one", "name": "Twin", "type": "species"},
                           {"id": "two", "name": "twin", "type": "species"}]"#;
            let store = TreeStore::from_json_str(json).expect("Failed to load");
            assert_eq!(store.find_by_name("TWIN").unwrap().id.as_str(), "one");
        }
    }

    describe "path_to_root" {
        before {
            let store = TreeStore::from_json_str(TREE).expect("Failed to load tree");
        }

        it "is root-first and ends at the node" {
            assert_eq!(ids(&store.path_to_root("mouse")), vec!["animal", "mammal", "mouse"]);
        }

        it "is a single element for a root" {
            assert_eq!(ids(&store.path_to_root("plant")), vec!["plant"]);
        }

        it "is empty for an unknown id" {
            assert!(store.path_to_root("ghost").is_empty());
        }
    }

    describe "lowest_common_ancestor" {
        before {
            let store = TreeStore::from_json_str(TREE).expect("Failed to load tree");
        }

        it "finds the shared parent of siblings" {
            assert_eq!(store.lowest_common_ancestor("mouse", "rat"), Some(NodeId::from("mammal")));
        }

        it "finds the root for distant cousins" {
            assert_eq!(store.lowest_common_ancestor("mouse", "eagle"), Some(NodeId::from("animal")));
        }

        it "returns None across trees of the forest" {
            assert_eq!(store.lowest_common_ancestor("mouse", "oak"), None);
        }
    }

    describe "listings" {
        before {
            let store = TreeStore::from_json_str(TREE).expect("Failed to load tree");
        }

        it "lists species in document order" {
            let species: Vec<&str> = store.species().iter().map(|n| n.id.as_str()).collect();
            assert_eq!(species, vec!["mouse", "rat", "eagle", "oak"]);
        }

        it "lists species names sorted" {
            assert_eq!(store.species_names(), vec!["Eagle", "Mouse", "Oak", "Rat"]);
        }

        it "lists direct children" {
            let children: Vec<&str> = store.children_of("animal").iter().map(|n| n.id.as_str()).collect();
            assert_eq!(children, vec!["mammal", "bird"]);
            assert!(store.children_of("mouse").is_empty());
        }

        it "lists roots" {
            let roots: Vec<&str> = store.roots().iter().map(|n| n.id.as_str()).collect();
            assert_eq!(roots, vec!["animal", "plant"]);
        }
    }

    describe "round trip" {
        before {
            let store = TreeStore::from_json_str(TREE).expect("Failed to load tree");
        }

        it "reproduces nodes and parents through unflatten and flatten" {
            let flat = flatten(&store.to_nested());
            let mut original: Vec<(String, Option<String>)> = store
                .nodes()
                .iter()
                .map(|n| (n.id.to_string(), n.parent_id.as_ref().map(|p| p.to_string())))
                .collect();
            let mut rebuilt: Vec<(String, Option<String>)> = flat
                .iter()
                .map(|n| (n.id.to_string(), n.parent_id.as_ref().map(|p| p.to_string())))
                .collect();
            original.sort();
            rebuilt.sort();
            assert_eq!(original, rebuilt);
            assert_eq!(flat.len(), store.len());
        }

        it "omits empty metadata and children when serialized" {
            let json = serde_json::to_value(store.to_nested()).expect("Failed to serialize");
            let rat = &json[0]["children"][0]["children"][1];
            assert_eq!(rat["id"], "rat");
            assert!(rat.get("description").is_none());
            assert!(rat.get("children").is_none());
            assert_eq!(json[0]["children"][0]["children"][0]["imageUrl"], "mouse.png");
        }
    }

    describe "load_tree_file" {
        it "loads a document from disk" {
            let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
            file.write_all(TREE.as_bytes()).expect("Failed to write");
            let loaded = load_tree_file(file.path()).expect("Failed to load");
            assert_eq!(loaded.len(), 8);
        }

        it "reports a missing file" {
            let err = load_tree_file("/definitely/not/here.json").unwrap_err();
            assert!(err.to_string().contains("Failed to read tree data"));
        }

        it "preserves the ingestion error for bad documents" {
            let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
            file.write_all(b"[]").expect("Failed to write");
            let err = load_tree_file(file.path()).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<TreeError>(),
                Some(TreeError::InvalidTreeDocument { .. })
            ));
        }
    }
}
