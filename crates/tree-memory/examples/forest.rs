use anyhow::Result;
use tree::prelude::*;
use tree::execute_in_tree_order;
use tree_memory::MemoryStorage;

fn main() -> Result<()> {
    env_logger::init();

    let storage = MemoryStorage::new();
    let provider = SimpleProvider::new(storage.clone());

    // Build a small forest:
    // docs
    // ├── guides
    // │   └── install
    // └── reference
    // blog
    let mut docs = storage.create();
    storage.save(&provider, &mut docs)?;
    let docs_id = docs.require_id()?;

    let mut guides = Item::child_of(docs_id);
    storage.save(&provider, &mut guides)?;

    let mut reference = Item::child_of(docs_id).with_weight(1);
    storage.save(&provider, &mut reference)?;

    let mut install = Item::child_of(guides.require_id()?);
    storage.save(&provider, &mut install)?;

    let mut blog = Item::new().with_weight(1);
    storage.save(&provider, &mut blog)?;

    println!("Roots:");
    for root in provider.roots(None)?.execute()? {
        println!("  {:?} (weight {})", root.id, root.weight);
    }

    println!("\nChildren of docs:");
    for child in provider.children_of(&docs, None)?.execute()? {
        println!("  {:?} (weight {})", child.id, child.weight);
    }

    println!("\nAncestors of install, nearest first:");
    for ancestor in provider.ancestors_of(&install, None)?.execute()? {
        println!("  {:?} at depth {:?}", ancestor.id, ancestor.depth);
    }

    println!("\nDescendants of docs in tree order:");
    let descendants = provider.descendants_of(&docs, None)?;
    for item in execute_in_tree_order(&provider, descendants)? {
        let depth = item.depth.unwrap_or_default() as usize;
        println!("{:indent$}{:?}", "", item.id, indent = depth * 2);
    }

    let root = provider.root_of(&install, None)?.first()?;
    println!("\nRoot of install: {:?}", root.and_then(|item| item.id));

    println!("\nQueries executed: {}", storage.executed_queries());

    Ok(())
}
