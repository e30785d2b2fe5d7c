use anyhow::Result;
use calnote_core::{CalnoteConfig, TaskStore};
use owo_colors::OwoColorize;

pub fn run(config: CalnoteConfig) -> Result<()> {
    let store = TaskStore::open(config.expanded_store_path()?)?;
    let tasks = store.handle()?.list()?;

    if tasks.is_empty() {
        println!("{}", "No tasks recorded yet".dimmed());
        return Ok(());
    }

    let mut current_date = None;
    for task in &tasks {
        if current_date != Some(task.due_date) {
            println!("{}", task.due_date_key().bold());
            current_date = Some(task.due_date);
        }
        println!("  {}", task.name);
    }

    println!(
        "\n{} task(s) in {}",
        tasks.len(),
        store.path().display().dimmed()
    );
    Ok(())
}
