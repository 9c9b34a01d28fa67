//! Database schema definitions
//!
//! Foreign keys are declared for documentation and tooling, but enforcement
//! is left off: relations may name endpoints that do not exist yet, and
//! entity deletion cascades explicitly in the store.

/// SQL to create the entities table
pub const CREATE_ENTITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    name TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL
)
"#;

/// SQL to create the observations table
pub const CREATE_OBSERVATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS observations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_name TEXT NOT NULL REFERENCES entities(name) ON DELETE CASCADE,
    content TEXT NOT NULL,
    UNIQUE(entity_name, content)
)
"#;

/// SQL to create the relations table
pub const CREATE_RELATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS relations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_entity TEXT NOT NULL REFERENCES entities(name) ON DELETE CASCADE,
    to_entity TEXT NOT NULL REFERENCES entities(name) ON DELETE CASCADE,
    relation_type TEXT NOT NULL,
    UNIQUE(from_entity, to_entity, relation_type)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_observations_entity ON observations(entity_name)",
    "CREATE INDEX IF NOT EXISTS idx_relations_from ON relations(from_entity)",
    "CREATE INDEX IF NOT EXISTS idx_relations_to ON relations(to_entity)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_ENTITIES_TABLE,
        CREATE_OBSERVATIONS_TABLE,
        CREATE_RELATIONS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
