//! SQLite storage implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use rusqlite::{Connection, ToSql, Transaction, TransactionBehavior, params};
use crate::{Result, Error};
use crate::graph::{
    AddedObservations, Entity, GraphStats, KnowledgeGraph, ObservationAddition,
    ObservationDeletion, Relation,
};
use super::schema;

/// How long a writer waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings applied when a store is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { busy_timeout: DEFAULT_BUSY_TIMEOUT }
    }
}

/// Entities matching a LIKE pattern bound to ?1 on name, type or any observation
const SEARCH_SELECTION: &str = r#"
    SELECT e.name FROM entities e
    WHERE e.name LIKE ?1 ESCAPE '\'
       OR e.entity_type LIKE ?1 ESCAPE '\'
       OR EXISTS (
           SELECT 1 FROM observations o
           WHERE o.entity_name = e.name AND o.content LIKE ?1 ESCAPE '\'
       )
"#;

/// Existing entities whose name is in the JSON array bound to ?1
const NAMED_SELECTION: &str =
    "SELECT name FROM entities WHERE name IN (SELECT value FROM json_each(?1))";

const ALL_SELECTION: &str = "SELECT name FROM entities";

/// SQLite-backed storage for one knowledge graph file.
///
/// Every public operation runs in its own transaction. Writes begin
/// `IMMEDIATE` so a second writer waits on the busy timeout up front
/// instead of failing mid-batch on a lock upgrade.
pub struct KnowledgeGraphStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl KnowledgeGraphStore {
    /// Open a database file (creates it and its directory if they don't exist)
    pub fn open(path: &Path, options: &StoreOptions) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        tracing::debug!("Opened {} (journal_mode={})", path.display(), mode);

        let store = Self {
            path: path.to_path_buf(),
            conn: Mutex::new(Some(conn)),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(Some(conn)),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            for stmt in schema::all_schema_statements() {
                conn.execute(stmt, [])?;
            }
            Ok(())
        })
    }

    /// Release the connection. Later operations fail with [`Error::Closed`].
    pub fn close(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| e)?;
            tracing::debug!("Closed {}", self.path.display());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let conn = guard.as_mut().ok_or(Error::Closed)?;
        f(conn)
    }

    /// Run `f` in a write transaction; any error rolls back the whole batch
    fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok(out)
        })
    }

    /// Run `f` in a read transaction so multi-statement reads see one snapshot
    fn read<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok(out)
        })
    }

    // ========== Entity Operations ==========

    /// Insert entities whose name is not taken yet. Returns the ones inserted.
    pub fn create_entities(&self, entities: &[Entity]) -> Result<Vec<Entity>> {
        let created = self.write(|tx| {
            let mut insert_entity = tx.prepare_cached(
                "INSERT OR IGNORE INTO entities (name, entity_type) VALUES (?1, ?2)",
            )?;
            let mut insert_observation = tx.prepare_cached(
                "INSERT OR IGNORE INTO observations (entity_name, content) VALUES (?1, ?2)",
            )?;

            let mut created = Vec::new();
            for entity in entities {
                if insert_entity.execute(params![entity.name, entity.entity_type])? == 0 {
                    continue;
                }
                let mut observations = Vec::with_capacity(entity.observations.len());
                for content in &entity.observations {
                    if insert_observation.execute(params![entity.name, content])? > 0 {
                        observations.push(content.clone());
                    }
                }
                created.push(Entity {
                    name: entity.name.clone(),
                    entity_type: entity.entity_type.clone(),
                    observations,
                });
            }
            Ok(created)
        })?;

        tracing::debug!("create_entities: {}/{} created", created.len(), entities.len());
        Ok(created)
    }

    /// Delete entities together with their observations and every relation
    /// touching them. Unknown names are ignored.
    pub fn delete_entities(&self, names: &[String]) -> Result<()> {
        self.write(|tx| {
            let mut delete_observations =
                tx.prepare_cached("DELETE FROM observations WHERE entity_name = ?1")?;
            let mut delete_relations = tx.prepare_cached(
                "DELETE FROM relations WHERE from_entity = ?1 OR to_entity = ?1",
            )?;
            let mut delete_entity = tx.prepare_cached("DELETE FROM entities WHERE name = ?1")?;

            for name in names {
                delete_observations.execute([name])?;
                delete_relations.execute([name])?;
                delete_entity.execute([name])?;
            }
            Ok(())
        })?;

        tracing::debug!("delete_entities: {} names", names.len());
        Ok(())
    }

    // ========== Observation Operations ==========

    /// Attach observations to existing entities.
    ///
    /// Fails with [`Error::EntityNotFound`] if any entity is missing, in which
    /// case nothing from the batch is committed.
    pub fn add_observations(
        &self,
        additions: &[ObservationAddition],
    ) -> Result<Vec<AddedObservations>> {
        self.write(|tx| {
            let mut exists = tx.prepare_cached("SELECT 1 FROM entities WHERE name = ?1")?;
            let mut insert = tx.prepare_cached(
                "INSERT OR IGNORE INTO observations (entity_name, content) VALUES (?1, ?2)",
            )?;

            let mut results = Vec::with_capacity(additions.len());
            for addition in additions {
                if !exists.exists([&addition.entity_name])? {
                    return Err(Error::EntityNotFound(addition.entity_name.clone()));
                }

                let mut added = Vec::new();
                for content in &addition.contents {
                    if insert.execute(params![addition.entity_name, content])? > 0 {
                        added.push(content.clone());
                    }
                }
                tracing::debug!(
                    "add_observations: {} new for {}",
                    added.len(),
                    addition.entity_name
                );
                results.push(AddedObservations {
                    entity_name: addition.entity_name.clone(),
                    added_observations: added,
                });
            }
            Ok(results)
        })
    }

    /// Remove observations. Missing entities or observations are ignored.
    pub fn delete_observations(&self, deletions: &[ObservationDeletion]) -> Result<()> {
        self.write(|tx| {
            let mut delete = tx.prepare_cached(
                "DELETE FROM observations WHERE entity_name = ?1 AND content = ?2",
            )?;
            for deletion in deletions {
                for content in &deletion.observations {
                    delete.execute(params![deletion.entity_name, content])?;
                }
            }
            Ok(())
        })
    }

    // ========== Relation Operations ==========

    /// Insert relations whose triple is not present yet. Returns the ones inserted.
    ///
    /// Endpoints are not checked for existence.
    pub fn create_relations(&self, relations: &[Relation]) -> Result<Vec<Relation>> {
        let created = self.write(|tx| {
            let mut insert = tx.prepare_cached(
                r#"
                INSERT OR IGNORE INTO relations (from_entity, to_entity, relation_type)
                VALUES (?1, ?2, ?3)
                "#,
            )?;

            let mut created = Vec::new();
            for rel in relations {
                if insert.execute(params![rel.from, rel.to, rel.relation_type])? > 0 {
                    created.push(rel.clone());
                }
            }
            Ok(created)
        })?;

        tracing::debug!("create_relations: {}/{} created", created.len(), relations.len());
        Ok(created)
    }

    /// Remove matching relation triples. Absent triples are ignored.
    pub fn delete_relations(&self, relations: &[Relation]) -> Result<()> {
        self.write(|tx| {
            let mut delete = tx.prepare_cached(
                "DELETE FROM relations WHERE from_entity = ?1 AND to_entity = ?2 AND relation_type = ?3",
            )?;
            for rel in relations {
                delete.execute(params![rel.from, rel.to, rel.relation_type])?;
            }
            Ok(())
        })
    }

    // ========== Query Operations ==========

    /// Every entity and every relation, from one snapshot
    pub fn read_graph(&self) -> Result<KnowledgeGraph> {
        self.read(|tx| {
            let entities = load_entities(tx, ALL_SELECTION, &[])?;
            let relations = load_relations(
                tx,
                "SELECT from_entity, to_entity, relation_type FROM relations ORDER BY id",
                &[],
            )?;
            Ok(KnowledgeGraph { entities, relations })
        })
    }

    /// Case-insensitive substring search over entity names, types and
    /// observations. Relations are included only when both endpoints match.
    ///
    /// Case folding is ASCII only: `"auth"` finds `"AuthService"`, but `"ä"`
    /// does not find `"Ärger"`.
    pub fn search_nodes(&self, query: &str) -> Result<KnowledgeGraph> {
        let pattern = like_pattern(query);
        let graph = self.read(|tx| load_subgraph(tx, SEARCH_SELECTION, params![pattern]))?;
        tracing::debug!("search_nodes({:?}): {} entities", query, graph.entities.len());
        Ok(graph)
    }

    /// The named entities that exist, plus relations between them
    pub fn open_nodes(&self, names: &[String]) -> Result<KnowledgeGraph> {
        let names_json = serde_json::to_string(names).map_err(|e| {
            rusqlite::Error::ToSqlConversionFailure(Box::new(e))
        })?;
        self.read(|tx| load_subgraph(tx, NAMED_SELECTION, params![names_json]))
    }

    /// Row counts
    pub fn stats(&self) -> Result<GraphStats> {
        self.read(|tx| {
            let count = |table: &str| -> Result<usize> {
                let n: i64 =
                    tx.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
                Ok(n as usize)
            };
            Ok(GraphStats {
                entities: count("entities")?,
                observations: count("observations")?,
                relations: count("relations")?,
            })
        })
    }
}

/// Entities (with observations) and the relations among them, for the
/// entity names produced by `selection`
fn load_subgraph(
    conn: &Connection,
    selection: &str,
    params: &[&dyn ToSql],
) -> Result<KnowledgeGraph> {
    let entities = load_entities(conn, selection, params)?;
    let relations = load_relations(
        conn,
        &format!(
            r#"
            SELECT from_entity, to_entity, relation_type FROM relations
            WHERE from_entity IN ({selection}) AND to_entity IN ({selection})
            ORDER BY id
            "#
        ),
        params,
    )?;
    Ok(KnowledgeGraph { entities, relations })
}

fn load_entities(
    conn: &Connection,
    selection: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<Entity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT name, entity_type FROM entities WHERE name IN ({selection}) ORDER BY rowid"
    ))?;
    let mut entities = stmt
        .query_map(params, |row| {
            Ok(Entity {
                name: row.get(0)?,
                entity_type: row.get(1)?,
                observations: Vec::new(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let positions: std::collections::HashMap<String, usize> = entities
        .iter()
        .enumerate()
        .map(|(i, e)| (e.name.clone(), i))
        .collect();

    let mut stmt = conn.prepare(&format!(
        "SELECT entity_name, content FROM observations WHERE entity_name IN ({selection}) ORDER BY id"
    ))?;
    let rows = stmt.query_map(params, |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (entity_name, content) = row?;
        if let Some(&i) = positions.get(&entity_name) {
            entities[i].observations.push(content);
        }
    }

    Ok(entities)
}

fn load_relations(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Relation>> {
    let mut stmt = conn.prepare(sql)?;
    let relations = stmt
        .query_map(params, |row| {
            Ok(Relation {
                from: row.get(0)?,
                to: row.get(1)?,
                relation_type: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(relations)
}

/// Build a `LIKE` pattern matching `query` as a literal substring
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(graph: &KnowledgeGraph) -> Vec<&str> {
        graph.entities.iter().map(|e| e.name.as_str()).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn seeded_store() -> KnowledgeGraphStore {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();
        store
            .create_entities(&[
                Entity::new("AuthService", "Service").with_observations(["handles login"]),
                Entity::new("Db", "Service").with_observations(["no auth here"]),
                Entity::new("Frontend", "App").with_observations(["react"]),
            ])
            .unwrap();
        store
            .create_relations(&[
                Relation::new("AuthService", "Db", "reads"),
                Relation::new("Frontend", "AuthService", "calls"),
                Relation::new("AuthService", "AuthService", "retries"),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_create_entity_twice_keeps_first() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();

        let first = store
            .create_entities(&[Entity::new("A", "Person").with_observations(["likes tea"])])
            .unwrap();
        assert_eq!(first.len(), 1);

        let second = store
            .create_entities(&[Entity::new("A", "Robot").with_observations(["likes oil"])])
            .unwrap();
        assert!(second.is_empty());

        let graph = store.read_graph().unwrap();
        assert_eq!(graph.entities.len(), 1);
        assert_eq!(graph.entities[0].entity_type, "Person");
        assert_eq!(graph.entities[0].observations, vec!["likes tea"]);
    }

    #[test]
    fn test_create_entities_within_batch_duplicates() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();

        let created = store
            .create_entities(&[
                Entity::new("A", "first"),
                Entity::new("B", "other"),
                Entity::new("A", "second"),
            ])
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].entity_type, "first");
        assert_eq!(store.read_graph().unwrap().entity("A").unwrap().entity_type, "first");
    }

    #[test]
    fn test_create_entity_dedupes_observations() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();

        let created = store
            .create_entities(&[Entity::new("A", "t").with_observations(["x", "y", "x"])])
            .unwrap();

        assert_eq!(created[0].observations, vec!["x", "y"]);
        assert_eq!(store.stats().unwrap().observations, 2);
    }

    #[test]
    fn test_create_relation_twice() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();
        store
            .create_entities(&[Entity::new("A", "t"), Entity::new("B", "t")])
            .unwrap();

        let rel = Relation::new("A", "B", "knows");
        let created = store.create_relations(&[rel.clone(), rel.clone()]).unwrap();
        assert_eq!(created, vec![rel.clone()]);

        let again = store.create_relations(&[rel.clone()]).unwrap();
        assert!(again.is_empty());

        // Same pair, different type is a distinct edge
        let other = store.create_relations(&[Relation::new("A", "B", "likes")]).unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(store.read_graph().unwrap().relations.len(), 2);
    }

    #[test]
    fn test_create_relation_with_missing_endpoints() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();

        let created = store
            .create_relations(&[Relation::new("Ghost", "Phantom", "haunts")])
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(store.read_graph().unwrap().relations.len(), 1);
    }

    #[test]
    fn test_add_observations_missing_entity_commits_nothing() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();
        store.create_entities(&[Entity::new("A", "t")]).unwrap();

        let err = store
            .add_observations(&[
                ObservationAddition { entity_name: "A".into(), contents: strings(&["fact"]) },
                ObservationAddition { entity_name: "Missing".into(), contents: strings(&["x"]) },
            ])
            .unwrap_err();

        assert!(matches!(err, Error::EntityNotFound(ref name) if name == "Missing"));
        assert!(store.read_graph().unwrap().entities[0].observations.is_empty());
    }

    #[test]
    fn test_add_observations_is_idempotent() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();
        store
            .create_entities(&[Entity::new("A", "t").with_observations(["old"])])
            .unwrap();

        let addition = ObservationAddition {
            entity_name: "A".into(),
            contents: strings(&["old", "new"]),
        };

        let first = store.add_observations(&[addition.clone()]).unwrap();
        assert_eq!(first[0].entity_name, "A");
        assert_eq!(first[0].added_observations, vec!["new"]);

        let second = store.add_observations(&[addition]).unwrap();
        assert!(second[0].added_observations.is_empty());

        let graph = store.read_graph().unwrap();
        assert_eq!(graph.entities[0].observations, vec!["old", "new"]);
    }

    #[test]
    fn test_same_observation_on_different_entities() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();
        store
            .create_entities(&[
                Entity::new("A", "t").with_observations(["shared"]),
                Entity::new("B", "t").with_observations(["shared"]),
            ])
            .unwrap();

        assert_eq!(store.stats().unwrap().observations, 2);
    }

    #[test]
    fn test_delete_entity_cascades() {
        let store = seeded_store();

        store.delete_entities(&strings(&["AuthService", "NeverExisted"])).unwrap();

        let graph = store.read_graph().unwrap();
        assert_eq!(names(&graph), vec!["Db", "Frontend"]);
        assert!(graph.relations.is_empty());

        let stats = store.stats().unwrap();
        assert_eq!(stats.observations, 2);
        assert_eq!(stats.relations, 0);
    }

    #[test]
    fn test_deleted_entity_can_be_recreated_clean() {
        let store = seeded_store();
        store.delete_entities(&strings(&["Db"])).unwrap();

        store.create_entities(&[Entity::new("Db", "Database")]).unwrap();

        let graph = store.open_nodes(&strings(&["Db"])).unwrap();
        assert!(graph.entities[0].observations.is_empty());
        assert!(graph.relations.is_empty());
    }

    #[test]
    fn test_delete_observation_round_trip() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();
        store.create_entities(&[Entity::new("A", "t")]).unwrap();
        store
            .add_observations(&[ObservationAddition {
                entity_name: "A".into(),
                contents: strings(&["keep", "drop"]),
            }])
            .unwrap();

        store
            .delete_observations(&[
                ObservationDeletion { entity_name: "A".into(), observations: strings(&["drop"]) },
                ObservationDeletion { entity_name: "Nobody".into(), observations: strings(&["x"]) },
            ])
            .unwrap();

        let graph = store.read_graph().unwrap();
        assert_eq!(graph.entities.len(), 1);
        assert_eq!(graph.entities[0].observations, vec!["keep"]);
    }

    #[test]
    fn test_delete_relations() {
        let store = seeded_store();

        store
            .delete_relations(&[
                Relation::new("AuthService", "Db", "reads"),
                Relation::new("Db", "AuthService", "reads"),
            ])
            .unwrap();

        let graph = store.read_graph().unwrap();
        assert_eq!(graph.relations.len(), 2);
        assert!(!graph.relations.contains(&Relation::new("AuthService", "Db", "reads")));
    }

    #[test]
    fn test_search_matches_name_type_and_observation() {
        let store = seeded_store();

        let graph = store.search_nodes("auth").unwrap();
        assert_eq!(names(&graph), vec!["AuthService", "Db"]);

        // Frontend -> AuthService crosses out of the match set
        assert_eq!(
            graph.relations,
            vec![
                Relation::new("AuthService", "Db", "reads"),
                Relation::new("AuthService", "AuthService", "retries"),
            ]
        );

        let by_type = store.search_nodes("APP").unwrap();
        assert_eq!(names(&by_type), vec!["Frontend"]);
        assert!(by_type.relations.is_empty());
    }

    #[test]
    fn test_search_ignores_relation_types() {
        let store = seeded_store();
        let graph = store.search_nodes("retries").unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();
        store
            .create_entities(&[
                Entity::new("100%_done", "Task"),
                Entity::new("1000 done", "Task"),
            ])
            .unwrap();

        assert_eq!(names(&store.search_nodes("%_").unwrap()), vec!["100%_done"]);
        assert!(store.search_nodes("\\").unwrap().entities.is_empty());
    }

    #[test]
    fn test_search_folds_ascii_case_only() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();
        store.create_entities(&[Entity::new("Ärger", "Word")]).unwrap();

        assert_eq!(names(&store.search_nodes("RGER").unwrap()), vec!["Ärger"]);
        assert_eq!(names(&store.search_nodes("Är").unwrap()), vec!["Ärger"]);
        assert!(store.search_nodes("är").unwrap().entities.is_empty());
    }

    #[test]
    fn test_open_nodes_omits_unknown() {
        let store = seeded_store();

        let graph = store.open_nodes(&strings(&["AuthService", "Z"])).unwrap();
        assert_eq!(names(&graph), vec!["AuthService"]);
        assert_eq!(graph.entities[0].observations, vec!["handles login"]);
        assert_eq!(graph.relations, vec![Relation::new("AuthService", "AuthService", "retries")]);

        let pair = store.open_nodes(&strings(&["Frontend", "AuthService"])).unwrap();
        assert_eq!(pair.entities.len(), 2);
        assert_eq!(pair.relations.len(), 2);

        assert!(store.open_nodes(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_open_nodes_skips_dangling_relations() {
        let store = KnowledgeGraphStore::open_in_memory().unwrap();
        store.create_entities(&[Entity::new("A", "t")]).unwrap();
        store.create_relations(&[Relation::new("A", "Z", "points_at")]).unwrap();

        let graph = store.open_nodes(&strings(&["A", "Z"])).unwrap();
        assert_eq!(names(&graph), vec!["A"]);
        assert!(graph.relations.is_empty());
    }

    #[test]
    fn test_read_graph_after_mixed_operations() {
        let store = seeded_store();
        store.create_entities(&[Entity::new("Cache", "Service")]).unwrap();
        store.create_relations(&[Relation::new("Cache", "Db", "fronts")]).unwrap();
        store.delete_entities(&strings(&["Db"])).unwrap();

        let graph = store.read_graph().unwrap();
        assert_eq!(names(&graph), vec!["AuthService", "Frontend", "Cache"]);
        assert_eq!(graph.relations.len(), 2);
        assert!(graph.relations.iter().all(|r| !r.touches("Db")));
    }

    #[test]
    fn test_closed_store_rejects_operations() {
        let store = seeded_store();
        store.close().unwrap();
        store.close().unwrap();

        assert!(store.is_closed());
        assert!(matches!(store.read_graph(), Err(Error::Closed)));
        assert!(matches!(store.create_entities(&[Entity::new("X", "t")]), Err(Error::Closed)));
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("auth"), "%auth%");
        assert_eq!(like_pattern("a%b_c\\"), "%a\\%b\\_c\\\\%");
    }
}
