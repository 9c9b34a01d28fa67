use tabled::{settings::Style, Table, Tabled};
use crate::graph::{GraphStats, KnowledgeGraph};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Entity")]
    name: String,
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Observations")]
    observations: String,
}

#[derive(Tabled)]
struct RelationRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "Relation")]
    relation_type: String,
    #[tabled(rename = "To")]
    to: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &GraphStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Entities", &stats.entities.to_string());
    builder.add_row("Observations", &stats.observations.to_string());
    builder.add_row("Relations", &stats.relations.to_string());
    builder.build()
}

/// Entities table followed by a relations table; empty parts are skipped
pub fn graph_table(graph: &KnowledgeGraph) -> String {
    let mut out = String::new();

    if !graph.entities.is_empty() {
        let rows: Vec<EntityRow> = graph
            .entities
            .iter()
            .map(|e| EntityRow {
                name: e.name.clone(),
                entity_type: e.entity_type.clone(),
                observations: e.observations.join("\n"),
            })
            .collect();
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    }

    if !graph.relations.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        let rows: Vec<RelationRow> = graph
            .relations
            .iter()
            .map(|r| RelationRow {
                from: r.from.clone(),
                relation_type: r.relation_type.clone(),
                to: r.to.clone(),
            })
            .collect();
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Entity, Relation};

    #[test]
    fn test_stats_table_lists_counts() {
        let table = stats_table(&GraphStats { entities: 3, observations: 7, relations: 2 });
        assert!(table.contains("Entities"));
        assert!(table.contains('7'));
    }

    #[test]
    fn test_graph_table_sections() {
        assert!(graph_table(&KnowledgeGraph::default()).is_empty());

        let graph = KnowledgeGraph {
            entities: vec![Entity::new("Alice", "Person").with_observations(["writes rust"])],
            relations: vec![Relation::new("Alice", "Bob", "knows")],
        };
        let table = graph_table(&graph);
        assert!(table.contains("Alice"));
        assert!(table.contains("writes rust"));
        assert!(table.contains("knows"));
    }
}
