// Print a summary of the lookup tables, optionally running a node search.
//
// Usage: cargo run --bin inspect_hierarchy [search term]

use rox_semantic_ui::{CatalogData, SearchIndex, ServerConfig};

fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    let data = CatalogData::load(&config.data_dir, &config.dcat_file, &config.opcua_file)?;

    println!("\n=== DCAT PROPERTIES ===\n");
    for class in data.properties.classes() {
        let properties = data.properties.properties(&class);
        println!("{} ({} properties)", class, properties.len());
        for property in properties {
            println!("  - {}", property);
        }
    }

    let table = &data.hierarchy;
    println!("\n=== OPC UA HIERARCHY ===\n");
    println!("{} nodes, {} level columns", table.len(), table.depth());
    for object_type in table.object_types() {
        let first_level = table.level_values(object_type, 1);
        println!("{}: {} level_1 values", object_type, first_level.len());
        println!("  Sample: {:?}", first_level.iter().take(5).collect::<Vec<_>>());
    }

    let Some(term) = std::env::args().nth(1) else {
        return Ok(());
    };

    let index = SearchIndex::build(table);
    let start = std::time::Instant::now();
    let hits = index.search(table, &term);
    println!("\n=== SEARCH '{}' ({} hits, {:?}) ===\n", term, hits.len(), start.elapsed());
    for hit in hits.iter().take(25) {
        println!("{:>8}  {:<10} {:<30} {}", hit.id, hit.node_type, hit.object_type, hit.full_name);
    }
    if hits.len() > 25 {
        println!("... {} more", hits.len() - 25);
    }

    Ok(())
}
