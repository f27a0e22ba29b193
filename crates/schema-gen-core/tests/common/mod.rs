//! Shared schema fixtures for the integration tests in this directory.

use schema_gen_core::{Node, Schema};

/// `{"name": string, "age": integer, "tags": [string], "active": bool}`
/// with only `name` required.
pub fn profile_schema() -> Schema {
    Schema::new(Node::object(
        [
            ("name".to_string(), Node::string()),
            ("age".to_string(), Node::integer(Some(0.0), Some(150.0))),
            (
                "tags".to_string(),
                Node::array(Node::string(), Some(0), Some(3)),
            ),
            ("active".to_string(), Node::Boolean),
        ],
        ["name".to_string()],
    ))
}

/// A self-referential linked-list-shaped schema: `{"value": string, "next": Node | null}`
/// modeled with `AnyOf` since this subset has no explicit null type.
pub fn recursive_list_schema() -> Schema {
    let node = Node::object(
        [
            ("value".to_string(), Node::string()),
            ("next".to_string(), Node::AnyOf(vec![Node::Ref("Node".to_string()), Node::Boolean])),
        ],
        ["value".to_string()],
    );
    Schema::with_defs(node.clone(), [("Node".to_string(), node)])
}
