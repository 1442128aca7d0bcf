use anyhow::Context;
use dagger::{foreign_key, Attributes, Graph, GraphConfig};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Dagger Graph v{}", dagger::version());
    println!("==========================================");
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let bytes = std::fs::read(&path).with_context(|| format!("reading config {}", path))?;
            GraphConfig::from_json(&bytes).with_context(|| format!("parsing config {}", path))?
        }
        None => GraphConfig::default(),
    };
    info!(?config, "starting demo");

    let graph = Graph::with_config(config);
    demo_property_graph(&graph)?;
    demo_validation(&graph)?;

    println!("\n=== Export ===");
    let json = graph.export_json()?;
    println!("{}", String::from_utf8_lossy(&json));

    graph.close();
    println!("\nClosed: {} nodes, {} edges", graph.node_count(), graph.edge_count());
    Ok(())
}

fn demo_property_graph(graph: &Graph) -> anyhow::Result<()> {
    println!("=== Demo 1: Property Graph ===");

    // Create people
    let alice = graph.get_or_create_node("person", "alice", Attributes::new())?;
    alice.patch([("name", "Alice"), ("city", "New York")])?;
    alice.set("age", 30i64)?;
    println!("✓ Created person: Alice (age 30, New York)");

    let bob = graph.get_or_create_node("person", "bob", Attributes::new())?;
    bob.patch([("name", "Bob"), ("city", "San Francisco")])?;
    bob.set("age", 25i64)?;
    println!("✓ Created person: Bob (age 25, San Francisco)");

    let acme = graph.get_or_create_node("company", "", Attributes::new())?;
    acme.set("name", "Acme")?;
    println!("✓ Created company with generated id {}", acme.id().id());

    // Create relationships
    let knows = graph.get_or_create_edge("knows", "e1", Attributes::new(), alice.id(), bob.id())?;
    knows.set("since", 2020i64)?;
    println!("✓ Alice -[knows]-> Bob (since 2020)");

    graph.get_or_create_edge("works_at", "", Attributes::new(), alice.id(), acme.id())?;
    println!("✓ Alice -[works_at]-> Acme");

    println!("\nGraph Statistics:");
    println!("  Total nodes: {}", graph.node_count());
    println!("  Total edges: {}", graph.edge_count());

    let mut node_types = graph.node_types();
    node_types.sort();
    let mut edge_types = graph.edge_types();
    edge_types.sort();
    println!("  Node types: {:?}", node_types);
    println!("  Edge types: {:?}", edge_types);

    println!("\nPeople:");
    let mut people = Vec::new();
    graph.range_node_types("person", |person| {
        people.push(person);
        true
    });
    for person in people {
        let mut fields = Vec::new();
        person.range(|key, value| {
            fields.push(format!("{}: {}", key, value));
            true
        })?;
        println!("  - {} {{{}}}", person.id(), fields.join(", "));
    }
    Ok(())
}

fn demo_validation(graph: &Graph) -> anyhow::Result<()> {
    println!("\n=== Demo 2: Endpoint Validation ===");

    let bob = foreign_key("person", "bob");
    graph.del_node(&bob);
    println!("✓ Deleted Bob; remaining edges: {}", graph.edge_count());

    let alice = foreign_key("person", "alice");
    match graph.get_or_create_edge("knows", "e2", Attributes::new(), &alice, &bob) {
        Ok(_) => anyhow::bail!("edge to a deleted node was accepted"),
        Err(err) => println!("✓ Rejected: {}", err),
    }
    Ok(())
}
